//! Shared type definitions for the ODL topology data source.
//!
//! The query model mirrors what the dashboard editor authors: a `uri` relative
//! to the controller base URL, a loop path selecting the repeating array in the
//! response, ordered column extraction rules, and ordered row filters. All
//! values are immutable once handed to the engine; editors produce updated
//! copies through the `with_*` constructors instead of mutating shared state.

use serde::{Deserialize, Serialize};

pub mod options;
mod response;
mod settings;
mod table;

pub use response::{DataResponse, HealthCheckResult, HealthStatus, QueryDataResponse};
pub use settings::{DEFAULT_BASE_URL, DataSourceSettings};
pub use table::{ColumnMeta, InferredType, Notice, NoticeSeverity, Table, TableRow};

/// Converter name that leaves the value untouched.
pub const PASSTHROUGH_CONVERTER: &str = "none";

/// Reference id assigned to queries that do not carry one.
pub const DEFAULT_REF_ID: &str = "A";

/// Point in a column's pipeline a value is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Value straight from the path resolver.
    #[default]
    Raw,
    /// Value after the capture pattern ran.
    Regex,
    /// Value after the converter ran.
    Conversion,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Raw, Stage::Regex, Stage::Conversion];

    /// Wire name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::Regex => "regex",
            Stage::Conversion => "conversion",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperation {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "!equals")]
    NotEquals,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "regexMatch")]
    RegexMatch,
    /// `regexNotMatch` is the spelling used by older saved dashboards.
    #[serde(rename = "!regexMatch", alias = "regexNotMatch")]
    NotRegexMatch,
}

impl FilterOperation {
    pub const ALL: [FilterOperation; 6] = [
        FilterOperation::Equals,
        FilterOperation::NotEquals,
        FilterOperation::GreaterThan,
        FilterOperation::LessThan,
        FilterOperation::RegexMatch,
        FilterOperation::NotRegexMatch,
    ];

    /// Wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperation::Equals => "equals",
            FilterOperation::NotEquals => "!equals",
            FilterOperation::GreaterThan => "gt",
            FilterOperation::LessThan => "lt",
            FilterOperation::RegexMatch => "regexMatch",
            FilterOperation::NotRegexMatch => "!regexMatch",
        }
    }

    /// True for operations whose `value` is a regular expression.
    pub fn uses_pattern(&self) -> bool {
        matches!(self, FilterOperation::RegexMatch | FilterOperation::NotRegexMatch)
    }
}

impl std::fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction rule for one output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnSpec {
    /// Output column name. A later column with the same name overwrites this one.
    pub name: String,
    /// Path expression evaluated against each loop element.
    pub path: String,
    pub regex_enabled: bool,
    /// Capture pattern, optionally with a `/$1` style replacement suffix.
    pub regex: String,
    pub converter_enabled: bool,
    /// Name of a registered converter.
    pub converter: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            path: String::new(),
            regex_enabled: false,
            regex: String::new(),
            converter_enabled: false,
            converter: PASSTHROUGH_CONVERTER.to_string(),
        }
    }
}

impl ColumnSpec {
    /// Passthrough column reading `path` into `name`.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets and enables the capture pattern.
    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = pattern.into();
        self.regex_enabled = true;
        self
    }

    /// Disables the capture pattern but keeps the authored text.
    pub fn without_regex(mut self) -> Self {
        self.regex_enabled = false;
        self
    }

    /// Sets and enables the converter.
    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = converter.into();
        self.converter_enabled = true;
        self
    }

    pub fn without_converter(mut self) -> Self {
        self.converter_enabled = false;
        self
    }

    /// Capture pattern that takes part in extraction, if any.
    ///
    /// An enabled but empty pattern is treated as disabled.
    pub fn active_regex(&self) -> Option<&str> {
        (self.regex_enabled && !self.regex.trim().is_empty()).then_some(self.regex.as_str())
    }

    /// Converter that takes part in extraction, if any.
    pub fn active_converter(&self) -> Option<&str> {
        (self.converter_enabled && !self.converter.trim().is_empty()).then_some(self.converter.trim())
    }
}

/// Row filter evaluated against one column's staged value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Name of the column the filter reads.
    pub field: String,
    #[serde(default)]
    pub when: Stage,
    pub operation: FilterOperation,
    #[serde(default)]
    pub value: String,
}

impl FilterSpec {
    pub fn new(field: impl Into<String>, when: Stage, operation: FilterOperation, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            when,
            operation,
            value: value.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_stage(mut self, when: Stage) -> Self {
        self.when = when;
        self
    }

    pub fn with_operation(mut self, operation: FilterOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// How the outcomes of the individual filters combine into a keep/drop decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FilterMode {
    /// Keep a row only when every filter accepts it.
    #[default]
    All,
    /// Keep a row when at least one filter accepts it. An empty list keeps every row.
    Any,
    /// Keep a row when the expression over filter indices evaluates to true.
    Expression { expression: FilterExpr },
}

/// Boolean expression over the query's filter list.
///
/// Serialized externally tagged, e.g. `{"and": [{"filter": 0}, {"not": {"filter": 1}}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterExpr {
    /// Outcome of the filter at this index in `Query::filters`.
    Filter(usize),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Every filter index referenced by the expression.
    pub fn referenced_filters(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        self.collect_filters(&mut indices);
        indices
    }

    fn collect_filters(&self, indices: &mut Vec<usize>) {
        match self {
            FilterExpr::Filter(index) => indices.push(*index),
            FilterExpr::And(children) | FilterExpr::Or(children) => {
                for child in children {
                    child.collect_filters(indices);
                }
            }
            FilterExpr::Not(child) => child.collect_filters(indices),
        }
    }
}

/// Declarative request for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Identifier of the query inside a multi-query request.
    #[serde(default = "default_ref_id")]
    pub ref_id: String,
    /// Controller path appended to the data source base URL.
    #[serde(default)]
    pub uri: String,
    /// Path selecting the array whose elements become rows.
    #[serde(default)]
    pub loop_path: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub filter_mode: FilterMode,
}

fn default_ref_id() -> String {
    DEFAULT_REF_ID.to_string()
}

impl Default for Query {
    fn default() -> Self {
        Self {
            ref_id: default_ref_id(),
            uri: String::new(),
            loop_path: String::new(),
            columns: Vec::new(),
            filters: Vec::new(),
            filter_mode: FilterMode::All,
        }
    }
}

impl Query {
    pub fn new(uri: impl Into<String>, loop_path: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            loop_path: loop_path.into(),
            ..Default::default()
        }
    }

    /// The editor's starting point: links of the first network topology, with
    /// router ids pulled out of the node names and rendered as IPv4 addresses.
    pub fn default_topology() -> Self {
        let router_pattern = r".*router=(\d+).*/$1";
        Self::new(
            "/rests/data/network-topology:network-topology",
            "network-topology:network-topology/topology[0]/link",
        )
        .with_column(
            ColumnSpec::new("source", "source/source-node")
                .with_regex(router_pattern)
                .with_converter("int2ip"),
        )
        .with_column(
            ColumnSpec::new("target", "destination/dest-node")
                .with_regex(router_pattern)
                .with_converter("int2ip"),
        )
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = ref_id.into();
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_loop_path(mut self, loop_path: impl Into<String>) -> Self {
        self.loop_path = loop_path.into();
        self
    }

    /// Appends a column.
    pub fn with_column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Replaces the column at `index`; out-of-range indices leave the query unchanged.
    pub fn with_column_at(mut self, index: usize, column: ColumnSpec) -> Self {
        if let Some(slot) = self.columns.get_mut(index) {
            *slot = column;
        }
        self
    }

    /// Removes the last column, mirroring the editor's "- Column" button.
    pub fn without_last_column(mut self) -> Self {
        self.columns.pop();
        self
    }

    /// Appends a filter.
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filter_mode(mut self, filter_mode: FilterMode) -> Self {
        self.filter_mode = filter_mode;
        self
    }
}
