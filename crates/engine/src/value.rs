//! Per-row staging area.
//!
//! Every column of a row keeps the value it had after each pipeline stage so
//! filters can look at any of them. Values are text, `null` (nothing found) or
//! an error marker (a converter rejected the input); the latter two never
//! compare equal to each other.

use indexmap::IndexMap;
use odl_types::Stage;
use serde_json::Value;

use crate::error::ConversionError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StagedValue {
    #[default]
    Null,
    Text(String),
    Error(ConversionError),
}

impl StagedValue {
    pub fn text(value: impl Into<String>) -> Self {
        StagedValue::Text(value.into())
    }

    /// Coerces a resolved JSON node to its staged form.
    ///
    /// Scalars become their textual form (`42`, `true`); objects and arrays
    /// become compact JSON so the row stays flat.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => StagedValue::Null,
            Value::String(text) => StagedValue::Text(text.clone()),
            Value::Number(number) => StagedValue::Text(number.to_string()),
            Value::Bool(flag) => StagedValue::Text(flag.to_string()),
            compound => StagedValue::Text(compound.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StagedValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StagedValue::Null)
    }

    pub fn as_error(&self) -> Option<&ConversionError> {
        match self {
            StagedValue::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Numeric reading of a text value; `None` for null, errors and non-numbers.
    pub fn as_number(&self) -> Option<f64> {
        self.as_text().and_then(parse_number)
    }
}

/// Parses a finite decimal number, ignoring surrounding whitespace.
///
/// Shared by `gt`/`lt` filters, the `sum` aggregate and column type inference
/// so all three agree on what counts as a number.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|number| number.is_finite())
}

/// One column's value after each stage.
///
/// Disabled stages copy the previous stage's value, so reading any stage
/// already gives the fallback behaviour filters expect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedColumn {
    pub raw: StagedValue,
    pub regex: StagedValue,
    pub conversion: StagedValue,
}

impl StagedColumn {
    pub fn stage(&self, stage: Stage) -> &StagedValue {
        match stage {
            Stage::Raw => &self.raw,
            Stage::Regex => &self.regex,
            Stage::Conversion => &self.conversion,
        }
    }

    /// Value shown in the table: the last stage of the pipeline.
    pub fn output(&self) -> &StagedValue {
        &self.conversion
    }
}

/// Column name to staged values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedRow {
    columns: IndexMap<String, StagedColumn>,
}

impl StagedRow {
    /// Stores a column; an existing column with the same name is overwritten in place.
    pub fn insert(&mut self, name: impl Into<String>, column: StagedColumn) {
        self.columns.insert(name.into(), column);
    }

    pub fn get(&self, name: &str) -> Option<&StagedColumn> {
        self.columns.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StagedColumn> {
        self.columns.get_mut(name)
    }

    /// Value of `name` at `stage`, if the column exists.
    pub fn value(&self, name: &str, stage: Stage) -> Option<&StagedValue> {
        self.get(name).map(|column| column.stage(stage))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StagedColumn)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
