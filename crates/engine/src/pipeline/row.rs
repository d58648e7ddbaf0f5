use serde_json::Value;

use super::compile::CompiledColumn;
use crate::value::{StagedColumn, StagedRow, StagedValue};

/// Runs resolve, extract and convert for every column of one loop element.
///
/// Disabled stages copy the previous stage. Aggregate converters leave the
/// conversion stage as the regex value until the row set is finalized.
pub(crate) fn build_row(columns: &[CompiledColumn], element: &Value) -> StagedRow {
    let mut row = StagedRow::default();
    for column in columns {
        let raw = column.path.resolve(element).map(StagedValue::from_json).unwrap_or_default();
        let regex = match &column.pattern {
            Some(pattern) => pattern.extract_staged(&raw),
            None => raw.clone(),
        };
        let conversion = match &column.converter {
            Some(converter) => converter.apply(&regex, &row),
            None => regex.clone(),
        };
        row.insert(column.name.clone(), StagedColumn { raw, regex, conversion });
    }
    row
}
