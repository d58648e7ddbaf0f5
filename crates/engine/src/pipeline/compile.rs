use odl_types::{ColumnMeta, ColumnSpec, InferredType, Notice, Query};
use tracing::debug;

use crate::convert::{Converter, ConverterRegistry};
use crate::error::ConfigurationError;
use crate::extract::CapturePattern;
use crate::filter::FilterSet;
use crate::path::JsonPath;

/// One column with its path parsed, pattern compiled and converter looked up.
#[derive(Debug, Clone)]
pub(crate) struct CompiledColumn {
    pub name: String,
    pub path: JsonPath,
    pub pattern: Option<CapturePattern>,
    pub converter: Option<Converter>,
}

impl CompiledColumn {
    fn compile(spec: &ColumnSpec, registry: &ConverterRegistry) -> Result<Self, ConfigurationError> {
        let path = JsonPath::parse(&spec.path).map_err(|source| ConfigurationError::InvalidColumnPath {
            column: spec.name.clone(),
            path: spec.path.clone(),
            source,
        })?;

        let pattern = spec
            .active_regex()
            .map(|pattern| {
                CapturePattern::compile(pattern).map_err(|error| ConfigurationError::InvalidColumnRegex {
                    column: spec.name.clone(),
                    pattern: pattern.to_string(),
                    message: error.to_string(),
                })
            })
            .transpose()?;

        let converter = spec
            .active_converter()
            .map(|name| {
                registry.get(name).cloned().ok_or_else(|| ConfigurationError::UnknownConverter {
                    column: spec.name.clone(),
                    converter: name.to_string(),
                    known: registry.names().join(", "),
                })
            })
            .transpose()?;

        Ok(Self {
            name: spec.name.clone(),
            path,
            pattern,
            converter,
        })
    }
}

/// Everything a query needs at run time, validated up front.
pub(crate) struct CompiledParts {
    pub loop_path: JsonPath,
    pub columns: Vec<CompiledColumn>,
    pub filters: FilterSet,
    /// Unique column names in first-declaration order.
    pub column_names: Vec<String>,
    /// Columns finalized by an aggregate converter, with that converter.
    pub aggregates: Vec<(String, Converter)>,
    pub notices: Vec<Notice>,
}

pub(crate) fn compile_parts(query: &Query, registry: &ConverterRegistry) -> Result<CompiledParts, ConfigurationError> {
    let loop_path = JsonPath::parse(&query.loop_path).map_err(|source| ConfigurationError::InvalidLoopPath {
        path: query.loop_path.clone(),
        source,
    })?;

    let columns = query
        .columns
        .iter()
        .map(|spec| CompiledColumn::compile(spec, registry))
        .collect::<Result<Vec<_>, _>>()?;

    let filters = FilterSet::compile(&query.filters, &query.filter_mode)?;

    let mut column_names: Vec<String> = Vec::new();
    for column in &columns {
        if !column_names.contains(&column.name) {
            column_names.push(column.name.clone());
        }
    }

    // A later duplicate overwrites the row value, so only the last column of a
    // name decides whether that name is aggregated.
    let aggregates = column_names
        .iter()
        .filter_map(|name| {
            let last = columns.iter().rev().find(|column| &column.name == name)?;
            match &last.converter {
                Some(converter @ Converter::Aggregate(_)) => Some((name.clone(), converter.clone())),
                _ => None,
            }
        })
        .collect();

    let notices = filters
        .filters()
        .iter()
        .enumerate()
        .filter(|(_, filter)| !column_names.contains(&filter.spec().field))
        .map(|(index, filter)| {
            Notice::warning(format!(
                "filter #{index} references unknown column '{}' and never matches",
                filter.spec().field
            ))
        })
        .collect();

    debug!(
        ref_id = %query.ref_id,
        columns = columns.len(),
        filters = filters.len(),
        loop_path = %loop_path,
        "compiled query"
    );

    Ok(CompiledParts {
        loop_path,
        columns,
        filters,
        column_names,
        aggregates,
        notices,
    })
}

/// Metadata for an empty result: every column typed as a string.
pub(crate) fn string_columns(names: &[String]) -> Vec<ColumnMeta> {
    names
        .iter()
        .map(|name| ColumnMeta {
            name: name.clone(),
            inferred_type: InferredType::String,
        })
        .collect()
}
