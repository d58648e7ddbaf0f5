use std::sync::Arc;

use odl_engine::{ConverterRegistry, DataSource, ExtractionOptions, StaticDocumentFetcher, extract_table, parse_queries};
use odl_types::{ColumnSpec, DataSourceSettings, FilterOperation, FilterSpec, InferredType, Query, Stage, Table};
use serde_json::{Value, json};

fn load_fixture() -> Value {
    serde_json::from_str(include_str!("data/topology_fixture.json")).expect("parse topology fixture")
}

fn run(document: &Value, query: &Query) -> Table {
    extract_table(document, query, &ConverterRegistry::default(), &ExtractionOptions::default()).expect("extract table")
}

fn strings(table: &Table, column: &str) -> Vec<Value> {
    table.column_values(column).cloned().collect()
}

#[test]
fn default_query_turns_router_ids_into_addresses() {
    let table = run(&load_fixture(), &Query::default_topology());

    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["source", "target"]);
    assert_eq!(table.column_type("source"), Some(InferredType::String));
    assert_eq!(strings(&table, "source"), vec![json!("1.2.3.4"), json!("192.168.1.177")]);
    assert_eq!(strings(&table, "target"), vec![json!("192.168.1.177"), json!("1.2.3.4")]);
    assert!(table.notices.is_empty(), "unexpected notices: {:?}", table.notices);
}

#[test]
fn passthrough_columns_yield_one_row_per_element() {
    let query = Query::new("", "network-topology:network-topology/topology[0]/node").with_column(ColumnSpec::new("node", "node-id"));
    let table = run(&load_fixture(), &query);
    assert_eq!(table.len(), 3);
    assert_eq!(strings(&table, "node")[2], json!("host:00:00:00:00:00:01"));
}

#[test]
fn loop_path_that_is_not_an_array_gives_no_rows() {
    for loop_path in [
        "network-topology:network-topology/topology[0]/topology-id",
        "network-topology:network-topology/topology[4]/link",
    ] {
        let query = Query::default_topology().with_loop_path(loop_path);
        let table = run(&load_fixture(), &query);
        assert!(table.is_empty(), "loop path {loop_path} produced rows");
        assert_eq!(table.columns.len(), 2);
    }
}

#[test]
fn non_numeric_node_ids_do_not_abort_conversion() {
    let query = Query::new("", "network-topology:network-topology/topology[0]/node")
        .with_column(ColumnSpec::new("ip", "node-id").with_regex(r"router=(\d+)").with_converter("int2ip"))
        .with_column(ColumnSpec::new("raw", "node-id").with_converter("int2ip"));
    let table = run(&load_fixture(), &query);

    assert_eq!(table.len(), 3);
    assert_eq!(strings(&table, "ip"), vec![json!("1.2.3.4"), json!("192.168.1.177"), Value::Null]);
    assert_eq!(strings(&table, "raw"), vec![Value::Null, Value::Null, Value::Null]);
    assert_eq!(table.notices.len(), 1, "notices: {:?}", table.notices);
    assert!(table.notices[0].text.starts_with("column 'raw': 3 value(s) failed conversion"));
}

#[test]
fn regex_extracts_first_group_or_null() {
    let document = json!({"items": [{"name": "router=42"}, {"name": "nomatch"}]});
    let query = Query::new("", "items").with_column(ColumnSpec::new("id", "name").with_regex(r"(\d+)"));
    let table = run(&document, &query);
    assert_eq!(strings(&table, "id"), vec![json!(42), Value::Null]);
    assert_eq!(table.column_type("id"), Some(InferredType::Number));
}

#[test]
fn not_regex_match_filter_drops_port_pairs() {
    let document = json!({"links": [{"source": "42:7"}, {"source": "router-1"}]});
    let query = Query::new("", "links")
        .with_column(ColumnSpec::new("source", "source"))
        .with_filter(FilterSpec::new("source", Stage::Raw, FilterOperation::NotRegexMatch, r"\d+:\d+"));
    let table = run(&document, &query);
    assert_eq!(strings(&table, "source"), vec![json!("router-1")]);
}

#[test]
fn identical_input_gives_identical_tables() {
    let document = load_fixture();
    let query = Query::default_topology().with_filter(FilterSpec::new("source", Stage::Conversion, FilterOperation::Equals, "1.2.3.4"));
    let first = run(&document, &query);
    let second = run(&document, &query);
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[test]
fn sum_reports_total_bandwidth_on_filtered_rows() {
    let query = Query::new("", "network-topology:network-topology/topology[0]/link")
        .with_column(ColumnSpec::new("link", "link-id"))
        .with_column(ColumnSpec::new("total", "bandwidth").with_converter("sum"))
        .with_filter(FilterSpec::new("link", Stage::Raw, FilterOperation::RegexMatch, "16909060"));
    let table = run(&load_fixture(), &query);
    assert_eq!(table.len(), 1);
    assert_eq!(strings(&table, "total"), vec![json!(350)]);
}

#[tokio::test]
async fn data_source_serves_queries_from_a_saved_document() {
    let queries = parse_queries(
        r#"
- refId: links
  uri: /rests/data/network-topology:network-topology
  loopPath: network-topology:network-topology/topology[0]/link
  columns:
    - name: source
      path: source/source-node
      regexEnabled: true
      regex: '.*router=(\d+).*/$1'
      converterEnabled: true
      converter: int2ip
- refId: broken
  uri: /rests/data/network-topology:network-topology
  loopPath: 'network-topology:network-topology/topology[0'
"#,
    )
    .expect("parse queries");

    let fetcher = StaticDocumentFetcher::new(load_fixture()).with_label("topology_fixture.json");
    let source = DataSource::with_fetcher(DataSourceSettings::default(), Arc::new(fetcher));
    let response = source.query_data(&queries).await;

    let links = response.get("links").expect("links response");
    assert_eq!(links.error, None);
    assert_eq!(strings(&links.table, "source"), vec![json!("1.2.3.4"), json!("192.168.1.177")]);

    let broken = response.get("broken").expect("broken response");
    assert!(broken.table.is_empty());
    assert!(broken.error.as_deref().unwrap_or_default().contains("invalid loop path"));
}
