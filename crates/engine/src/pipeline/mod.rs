//! # Row pipeline
//!
//! Turns a JSON document and a [`Query`] into a [`Table`] in two phases:
//!
//! 1. **Build**: resolve the loop path to an array and, for every element in
//!    source order, stage each column through resolve, extract and convert.
//!    The time budget is checked before each element.
//! 2. **Finish**: finalize aggregate converters over all built rows, apply the
//!    filter set, then project the last enabled stage of each column.
//!
//! A query is compiled once ([`CompiledQuery::compile`]) and can then run
//! against any number of documents. Running the same compiled query on the
//! same document always yields the same table.

mod compile;
mod emit;
mod row;

use std::time::{Duration, Instant};

use odl_types::{Notice, Query, Table};
use serde_json::Value;
use tracing::{debug, info};

use crate::convert::{Converter, ConverterRegistry};
use crate::error::{ConfigurationError, ExtractionError};
use crate::filter::FilterSet;
use crate::path::JsonPath;

use compile::{CompiledColumn, compile_parts, string_columns};

/// Knobs for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Abort with [`ExtractionError::Timeout`] once row building exceeds this.
    pub timeout: Option<Duration>,
}

impl ExtractionOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A validated query, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    ref_id: String,
    loop_path: JsonPath,
    columns: Vec<CompiledColumn>,
    filters: FilterSet,
    column_names: Vec<String>,
    aggregates: Vec<(String, Converter)>,
    notices: Vec<Notice>,
}

impl CompiledQuery {
    /// Parses every path, compiles every pattern and resolves every converter
    /// name. Nothing about the document is needed yet.
    pub fn compile(query: &Query, registry: &ConverterRegistry) -> Result<Self, ConfigurationError> {
        let parts = compile_parts(query, registry)?;
        Ok(Self {
            ref_id: query.ref_id.clone(),
            loop_path: parts.loop_path,
            columns: parts.columns,
            filters: parts.filters,
            column_names: parts.column_names,
            aggregates: parts.aggregates,
            notices: parts.notices,
        })
    }

    pub fn ref_id(&self) -> &str {
        &self.ref_id
    }

    /// Output column names in table order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Warnings found while compiling, such as filters on unknown columns.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn execute(&self, document: &Value, options: &ExtractionOptions) -> Result<Table, ExtractionError> {
        let started = Instant::now();

        let Some(Value::Array(elements)) = self.loop_path.resolve(document) else {
            info!(ref_id = %self.ref_id, loop_path = %self.loop_path, "loop path is not an array; returning an empty table");
            let mut table = Table::empty(string_columns(&self.column_names));
            table.notices = self.notices.clone();
            table.notices.push(Notice::info(format!(
                "loop path {} did not resolve to an array; no rows extracted",
                self.loop_path
            )));
            return Ok(table);
        };

        let mut rows = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            if let Some(budget) = options.timeout
                && started.elapsed() >= budget
            {
                return Err(ExtractionError::Timeout {
                    budget,
                    rows_built: index,
                    rows_total: elements.len(),
                });
            }
            rows.push(row::build_row(&self.columns, element));
        }
        let built = rows.len();

        emit::finalize_aggregates(&mut rows, &self.aggregates);
        rows.retain(|row| self.filters.accepts(row));

        let mut table = emit::emit_table(&rows, &self.column_names);
        let mut notices = self.notices.clone();
        notices.append(&mut table.notices);
        table.notices = notices;

        debug!(
            ref_id = %self.ref_id,
            built,
            kept = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extraction finished"
        );
        Ok(table)
    }
}

/// Compiles `query` and runs it against `document`.
pub fn extract_table(
    document: &Value,
    query: &Query,
    registry: &ConverterRegistry,
    options: &ExtractionOptions,
) -> Result<Table, ExtractionError> {
    CompiledQuery::compile(query, registry)?.execute(document, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use odl_types::{ColumnSpec, FilterOperation, FilterSpec, InferredType, NoticeSeverity, Stage};
    use serde_json::json;

    fn links() -> Value {
        json!({
            "links": [
                {"id": "l1", "bytes": 10, "node": "openflow:router=16909060"},
                {"id": "l2", "bytes": "n/a", "node": "host:00:11"},
                {"id": "l3", "bytes": 5, "node": "openflow:router=3232235953"}
            ]
        })
    }

    fn run(query: &Query) -> Result<Table, ExtractionError> {
        extract_table(&links(), query, &ConverterRegistry::default(), &ExtractionOptions::default())
    }

    #[test]
    fn one_row_per_element() {
        let query = Query::new("", "links").with_column(ColumnSpec::new("id", "id"));
        let table = run(&query).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_values("id").collect::<Vec<_>>(), vec![&json!("l1"), &json!("l2"), &json!("l3")]);
    }

    #[test]
    fn missing_or_scalar_loop_path_gives_an_empty_table() {
        for loop_path in ["missing", "links[0].id"] {
            let query = Query::new("", loop_path).with_column(ColumnSpec::new("id", "id"));
            let table = run(&query).unwrap();
            assert!(table.is_empty());
            assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["id"]);
            assert_eq!(table.notices[0].severity, NoticeSeverity::Info);
        }
    }

    #[test]
    fn configuration_errors_stop_before_any_row() {
        let unknown = Query::new("", "links").with_column(ColumnSpec::new("ip", "node").with_converter("ip2int"));
        assert!(matches!(
            run(&unknown),
            Err(ExtractionError::Configuration(ConfigurationError::UnknownConverter { .. }))
        ));

        let bad_regex = Query::new("", "links").with_column(ColumnSpec::new("ip", "node").with_regex("(\\d+"));
        assert!(matches!(
            run(&bad_regex),
            Err(ExtractionError::Configuration(ConfigurationError::InvalidColumnRegex { .. }))
        ));

        let bad_loop = Query::new("", "links[");
        assert!(matches!(
            run(&bad_loop),
            Err(ExtractionError::Configuration(ConfigurationError::InvalidLoopPath { .. }))
        ));
    }

    #[test]
    fn disabled_regex_is_not_compiled() {
        let mut column = ColumnSpec::new("id", "id").with_regex("(");
        column.regex_enabled = false;
        let table = run(&Query::new("", "links").with_column(column)).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn sum_totals_rows_before_filtering() {
        let query = Query::new("", "links")
            .with_column(ColumnSpec::new("id", "id"))
            .with_column(ColumnSpec::new("total", "bytes").with_converter("sum"))
            .with_filter(FilterSpec::new("id", Stage::Raw, FilterOperation::Equals, "l1"));
        let table = run(&query).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0]["total"], json!(15));
        assert_eq!(table.column_type("total"), Some(InferredType::Number));
    }

    #[test]
    fn filters_on_unknown_columns_drop_rows_and_warn() {
        let query = Query::new("", "links")
            .with_column(ColumnSpec::new("id", "id"))
            .with_filter(FilterSpec::new("ident", Stage::Raw, FilterOperation::NotEquals, "l2"));
        let table = run(&query).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.notices.len(), 1);
        assert_eq!(table.notices[0].severity, NoticeSeverity::Warning);
        assert!(table.notices[0].text.contains("'ident'"));
    }

    #[test]
    fn zero_budget_times_out_instead_of_returning_partial_rows() {
        let query = Query::new("", "links").with_column(ColumnSpec::new("id", "id"));
        let options = ExtractionOptions::default().with_timeout(Duration::ZERO);
        let error = extract_table(&links(), &query, &ConverterRegistry::default(), &options).unwrap_err();
        assert_eq!(
            error,
            ExtractionError::Timeout {
                budget: Duration::ZERO,
                rows_built: 0,
                rows_total: 3,
            }
        );
    }

    #[test]
    fn compiled_queries_are_reusable() {
        let query = Query::new("", "links").with_column(ColumnSpec::new("id", "id"));
        let compiled = CompiledQuery::compile(&query, &ConverterRegistry::default()).unwrap();
        let first = compiled.execute(&links(), &ExtractionOptions::default()).unwrap();
        let second = compiled.execute(&links(), &ExtractionOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(compiled.ref_id(), "A");
    }
}
