//! # ODL Engine
//!
//! Turns JSON documents served by an OpenDaylight controller into flat tables.
//! A [`Query`] names the array whose elements become rows (the loop path), the
//! columns to pull out of every element, and the filters a row must pass.
//!
//! ## Key Features
//!
//! - **Path resolution**: dotted, slash separated and JSONPath bracket paths
//! - **Capture patterns**: first group, whole match, or sed-style `pattern/$1`
//! - **Converters**: pluggable per-row and aggregate transforms (`int2ip`, `sum`, `none`)
//! - **Filters**: six comparison operations combined with all/any/expression modes
//! - **Data source**: multi-query requests keyed by `refId`, plus a health check
//!
//! ## Usage
//!
//! ```rust
//! use odl_engine::{ConverterRegistry, ExtractionOptions, extract_table};
//! use odl_types::{ColumnSpec, Query};
//! use serde_json::json;
//!
//! let document = json!({"link": [{"source": {"source-node": "openflow:router=16909060"}}]});
//! let query = Query::new("/rests/data/x", "link")
//!     .with_column(ColumnSpec::new("source", "source/source-node").with_regex(r"router=(\d+)").with_converter("int2ip"));
//!
//! let table = extract_table(&document, &query, &ConverterRegistry::default(), &ExtractionOptions::default())?;
//! assert_eq!(table.rows[0]["source"], json!("1.2.3.4"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`path`**: path expression parser and resolver
//! - **`extract`**: regex stage
//! - **`convert`**: converter traits, built-ins and the registry
//! - **`filter`**: row filters and their combination
//! - **`pipeline`**: compiles a query and runs it over a document
//! - **`fetch`** / **`datasource`**: where documents come from and the request facade

use std::{fs, path::Path};

use anyhow::{Context, Result};
use odl_types::Query;
use serde::Deserialize;

pub mod convert;
pub mod datasource;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod path;
pub mod pipeline;
pub mod value;

pub use convert::{AggregateConverter, Converter, ConverterKind, ConverterRegistry, RowConverter};
pub use datasource::DataSource;
pub use error::{ConfigurationError, ConversionError, ExtractionError, RegistryError};
pub use extract::CapturePattern;
pub use fetch::{DocumentFetcher, HttpDocumentFetcher, StaticDocumentFetcher};
pub use filter::{CompiledFilter, FilterSet};
pub use path::{JsonPath, PathSegment, PathSyntaxError};
pub use pipeline::{CompiledQuery, ExtractionOptions, extract_table};
pub use value::{StagedColumn, StagedRow, StagedValue};

/// Parses query definitions from YAML or JSON text.
///
/// Accepts a list of queries, a document with the list under `queries`, or a
/// single query.
pub fn parse_queries(content: &str) -> Result<Vec<Query>> {
    // Try the list forms first so a `queries:` document is not read as one
    // query with every field defaulted.
    if let Ok(queries) = serde_yaml::from_str::<Vec<Query>>(content) {
        return Ok(queries);
    }

    #[derive(Deserialize)]
    struct QueryDocument {
        queries: Vec<Query>,
    }

    if let Ok(document) = serde_yaml::from_str::<QueryDocument>(content) {
        return Ok(document.queries);
    }

    let query = serde_yaml::from_str::<Query>(content).context(
        "Unsupported query document format. Expected one of:\n\
         - a single query with 'uri', 'loopPath', 'columns' and 'filters' fields\n\
         - a list of queries\n\
         - a document with queries under the 'queries' key",
    )?;
    Ok(vec![query])
}

/// Loads query definitions from a file; see [`parse_queries`].
pub fn parse_query_file(file_path: impl AsRef<Path>) -> Result<Vec<Query>> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read query file: {}", file_path.display()))?;
    parse_queries(&content).with_context(|| format!("Failed to parse query file: {}", file_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use odl_types::{FilterMode, FilterOperation, Stage};

    #[test]
    fn test_parse_query_file_single_yaml_query() {
        let temp_dir = tempfile::tempdir().unwrap();
        let query_path = temp_dir.path().join("links.yaml");

        let query_content = r#"
refId: links
uri: /rests/data/network-topology:network-topology
loopPath: network-topology:network-topology/topology[0]/link
columns:
  - name: source
    path: source/source-node
    regexEnabled: true
    regex: '.*router=(\d+).*/$1'
    converterEnabled: true
    converter: int2ip
filters:
  - field: source
    when: raw
    operation: regexNotMatch
    value: '\d+:\d+'
"#;
        fs::write(&query_path, query_content).unwrap();

        let queries = parse_query_file(&query_path).expect("parse single query");
        assert_eq!(queries.len(), 1);
        let query = &queries[0];
        assert_eq!(query.ref_id, "links");
        assert_eq!(query.columns[0].active_converter(), Some("int2ip"));
        assert_eq!(query.filters[0].operation, FilterOperation::NotRegexMatch);
        assert_eq!(query.filters[0].when, Stage::Raw);
        assert_eq!(query.filter_mode, FilterMode::All);
    }

    #[test]
    fn test_parse_queries_list_and_wrapped_forms() {
        let json_list = r#"[{"refId": "A", "uri": "/a", "loopPath": "x"}, {"refId": "B", "uri": "/b", "loopPath": "y"}]"#;
        let queries = parse_queries(json_list).expect("parse json list");
        assert_eq!(queries.iter().map(|query| query.ref_id.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);

        let wrapped = "queries:\n  - uri: /a\n    loopPath: x\n    filterMode:\n      mode: any\n";
        let queries = parse_queries(wrapped).expect("parse wrapped list");
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].ref_id, "A");
        assert_eq!(queries[0].filter_mode, FilterMode::Any);
    }

    #[test]
    fn test_parse_query_file_reports_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let error = parse_query_file(temp_dir.path().join("absent.yaml")).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read query file"));
    }

    #[test]
    fn test_parse_queries_rejects_scalars() {
        assert!(parse_queries("42").is_err());
    }
}
