//! Row filters.
//!
//! A [`CompiledFilter`] reads one column of a staged row at the stage named by
//! its [`FilterSpec`] and compares it with the filter value. A [`FilterSet`] combines
//! the outcomes according to the query's [`FilterMode`].
//!
//! Null and error values never satisfy `equals`, `gt`, `lt` or `regexMatch`
//! and always satisfy `!equals` and `!regexMatch`. A filter naming a column
//! the row does not have never matches, whatever its operation.

use odl_types::{FilterExpr, FilterMode, FilterOperation, FilterSpec};
use regex::Regex;

use crate::error::ConfigurationError;
use crate::value::{StagedRow, StagedValue, parse_number};

#[derive(Debug, Clone)]
pub struct CompiledFilter {
    spec: FilterSpec,
    pattern: Option<Regex>,
}

impl CompiledFilter {
    /// `index` is the filter's position in the query and only used for error messages.
    pub fn compile(index: usize, spec: &FilterSpec) -> Result<Self, ConfigurationError> {
        let pattern = if spec.operation.uses_pattern() {
            let regex = Regex::new(&spec.value).map_err(|error| ConfigurationError::InvalidFilterRegex {
                index,
                field: spec.field.clone(),
                pattern: spec.value.clone(),
                message: error.to_string(),
            })?;
            Some(regex)
        } else {
            None
        };
        Ok(Self {
            spec: spec.clone(),
            pattern,
        })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn evaluate(&self, row: &StagedRow) -> bool {
        let Some(value) = row.value(&self.spec.field, self.spec.when) else {
            return false;
        };
        let text = value.as_text();
        let expected = self.spec.value.as_str();

        match self.spec.operation {
            FilterOperation::Equals => text == Some(expected),
            FilterOperation::NotEquals => text != Some(expected),
            FilterOperation::GreaterThan => compare(value, expected, |left, right| left > right),
            FilterOperation::LessThan => compare(value, expected, |left, right| left < right),
            FilterOperation::RegexMatch => self.matches(text),
            FilterOperation::NotRegexMatch => !self.matches(text),
        }
    }

    fn matches(&self, text: Option<&str>) -> bool {
        match (&self.pattern, text) {
            (Some(pattern), Some(text)) => pattern.is_match(text),
            _ => false,
        }
    }
}

fn compare(value: &StagedValue, expected: &str, ordering: impl Fn(f64, f64) -> bool) -> bool {
    match (value.as_number(), parse_number(expected)) {
        (Some(left), Some(right)) => ordering(left, right),
        _ => false,
    }
}

/// The query's filters plus the rule combining them.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<CompiledFilter>,
    mode: FilterMode,
}

impl FilterSet {
    pub fn compile(specs: &[FilterSpec], mode: &FilterMode) -> Result<Self, ConfigurationError> {
        let filters = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| CompiledFilter::compile(index, spec))
            .collect::<Result<Vec<_>, _>>()?;

        if let FilterMode::Expression { expression } = mode
            && let Some(index) = expression.referenced_filters().into_iter().find(|index| *index >= filters.len())
        {
            return Err(ConfigurationError::FilterIndexOutOfRange {
                index,
                count: filters.len(),
            });
        }

        Ok(Self {
            filters,
            mode: mode.clone(),
        })
    }

    pub fn filters(&self) -> &[CompiledFilter] {
        &self.filters
    }

    pub fn mode(&self) -> &FilterMode {
        &self.mode
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether `row` survives filtering.
    pub fn accepts(&self, row: &StagedRow) -> bool {
        match &self.mode {
            FilterMode::All => self.filters.iter().all(|filter| filter.evaluate(row)),
            FilterMode::Any => self.filters.is_empty() || self.filters.iter().any(|filter| filter.evaluate(row)),
            FilterMode::Expression { expression } => self.evaluate_expression(expression, row),
        }
    }

    fn evaluate_expression(&self, expression: &FilterExpr, row: &StagedRow) -> bool {
        match expression {
            FilterExpr::Filter(index) => self.filters.get(*index).is_some_and(|filter| filter.evaluate(row)),
            FilterExpr::And(children) => children.iter().all(|child| self.evaluate_expression(child, row)),
            FilterExpr::Or(children) => children.iter().any(|child| self.evaluate_expression(child, row)),
            FilterExpr::Not(child) => !self.evaluate_expression(child, row),
        }
    }
}
