use odl_types::{ColumnMeta, InferredType, Notice, Stage, Table, TableRow};
use serde_json::{Number, Value};
use tracing::debug;

use crate::convert::Converter;
use crate::value::{StagedRow, StagedValue, parse_number};

/// Replaces the conversion stage of aggregated columns with the aggregate over
/// every built row. Aggregates read the regex stage.
pub(crate) fn finalize_aggregates(rows: &mut [StagedRow], aggregates: &[(String, Converter)]) {
    for (name, converter) in aggregates {
        let values: Vec<StagedValue> = rows
            .iter()
            .map(|row| row.value(name, Stage::Regex).cloned().unwrap_or_default())
            .collect();
        let Some(total) = converter.finalize(name, &values) else {
            continue;
        };
        debug!(column = %name, rows = values.len(), total = ?total, "aggregate finalized");
        for row in rows.iter_mut() {
            if let Some(column) = row.get_mut(name) {
                column.conversion = total.clone();
            }
        }
    }
}

/// Projects the surviving rows onto the output table.
///
/// Error markers render as `null`; each column with failures gets one warning
/// notice carrying the count and the first error.
pub(crate) fn emit_table(rows: &[StagedRow], column_names: &[String]) -> Table {
    let mut notices = Vec::new();
    let mut columns = Vec::with_capacity(column_names.len());

    for name in column_names {
        let outputs: Vec<&StagedValue> = rows
            .iter()
            .filter_map(|row| row.get(name).map(|column| column.output()))
            .collect();

        let mut errors = outputs.iter().filter_map(|value| value.as_error());
        if let Some(first) = errors.next() {
            let count = errors.count() + 1;
            notices.push(Notice::warning(format!(
                "column '{name}': {count} value(s) failed conversion (first error: {first})"
            )));
        }

        columns.push(ColumnMeta {
            name: name.clone(),
            inferred_type: infer_type(&outputs),
        });
    }

    let rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|meta| {
                    let value = row.get(&meta.name).map(|column| column.output());
                    (meta.name.clone(), cell(value, meta.inferred_type))
                })
                .collect::<TableRow>()
        })
        .collect();

    Table { columns, rows, notices }
}

/// `number` when there is at least one non-null output and every one of them
/// survives the trip to a JSON number unchanged.
fn infer_type(values: &[&StagedValue]) -> InferredType {
    let mut texts = values.iter().filter_map(|value| value.as_text()).peekable();
    if texts.peek().is_some() && texts.all(|text| number(text).is_some()) {
        InferredType::Number
    } else {
        InferredType::String
    }
}

fn cell(value: Option<&StagedValue>, inferred_type: InferredType) -> Value {
    match (value.and_then(StagedValue::as_text), inferred_type) {
        (None, _) => Value::Null,
        (Some(text), InferredType::String) => Value::String(text.to_string()),
        (Some(text), InferredType::Number) => number(text).unwrap_or_else(|| Value::String(text.to_string())),
    }
}

/// JSON number for `text`, only when its canonical rendering is the trimmed
/// text itself. Leading zeros, exponents and digits beyond `f64` precision
/// stay strings.
fn number(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let candidate = if let Ok(integer) = trimmed.parse::<i64>() {
        Value::from(integer)
    } else if let Ok(unsigned) = trimmed.parse::<u64>() {
        Value::from(unsigned)
    } else {
        parse_number(trimmed).and_then(Number::from_f64).map(Value::Number)?
    };
    (candidate.to_string() == trimmed).then_some(candidate)
}
