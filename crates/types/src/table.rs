use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One output row: column name to scalar (`string`, `number`, or `null`).
pub type TableRow = IndexMap<String, Value>;

/// Column type advertised to the rendering side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    #[default]
    String,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMeta {
    pub name: String,
    pub inferred_type: InferredType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Info,
    Warning,
}

/// Non-fatal message attached to a table, e.g. conversion failures in a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Warning,
            text: text.into(),
        }
    }
}

/// Flat result of one extraction run.
///
/// Column order follows the query's column declarations (first occurrence of
/// each name); row order follows the source array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<TableRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl Table {
    /// Table with the given column layout and no rows.
    pub fn empty(columns: Vec<ColumnMeta>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Values of one column in row order; rows missing the column yield `Null`.
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |row| row.get(name).unwrap_or(&Value::Null))
    }

    pub fn column_type(&self, name: &str) -> Option<InferredType> {
        self.columns.iter().find(|column| column.name == name).map(|column| column.inferred_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_types_in_lowercase_and_omits_empty_notices() {
        let mut table = Table::empty(vec![ColumnMeta {
            name: "bytes".to_string(),
            inferred_type: InferredType::Number,
        }]);
        table.rows.push(TableRow::from([("bytes".to_string(), json!(42))]));

        let value = serde_json::to_value(&table).expect("serialize table");
        assert_eq!(value["columns"][0]["inferredType"], "number");
        assert_eq!(value["rows"][0]["bytes"], 42);
        assert!(value.get("notices").is_none());
    }

    #[test]
    fn column_values_fill_gaps_with_null() {
        let mut table = Table::empty(Vec::new());
        table.rows.push(TableRow::from([("a".to_string(), json!("x"))]));
        table.rows.push(TableRow::new());
        let values: Vec<_> = table.column_values("a").cloned().collect();
        assert_eq!(values, vec![json!("x"), Value::Null]);
    }
}
