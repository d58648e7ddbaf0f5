//! Error taxonomy of the extraction engine.
//!
//! Only two things stop an extraction: a query that cannot be compiled
//! ([`ConfigurationError`], reported before any row is touched) and an
//! exhausted time budget. Missing paths, regex misses and conversion failures
//! are per-value outcomes carried in [`crate::StagedValue`].

use std::time::Duration;

use thiserror::Error;

use crate::path::PathSyntaxError;

/// A query that cannot run as written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid loop path '{path}': {source}")]
    InvalidLoopPath {
        path: String,
        #[source]
        source: PathSyntaxError,
    },

    #[error("column '{column}' has an invalid path '{path}': {source}")]
    InvalidColumnPath {
        column: String,
        path: String,
        #[source]
        source: PathSyntaxError,
    },

    #[error("column '{column}' has an invalid regex '{pattern}': {message}")]
    InvalidColumnRegex { column: String, pattern: String, message: String },

    #[error("filter #{index} on '{field}' has an invalid regex '{pattern}': {message}")]
    InvalidFilterRegex {
        index: usize,
        field: String,
        pattern: String,
        message: String,
    },

    #[error("column '{column}' references unknown converter '{converter}' (known: {known})")]
    UnknownConverter { column: String, converter: String, known: String },

    #[error("filter expression references filter #{index} but the query defines {count} filter(s)")]
    FilterIndexOutOfRange { index: usize, count: usize },
}

/// Failure of a whole extraction run. No partial table accompanies it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("extraction exceeded its {}ms budget after {rows_built} of {rows_total} rows", .budget.as_millis())]
    Timeout {
        budget: Duration,
        rows_built: usize,
        rows_total: usize,
    },
}

/// Failure of a converter on a single value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{converter}: {message}")]
pub struct ConversionError {
    pub converter: String,
    pub message: String,
}

impl ConversionError {
    pub fn new(converter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            converter: converter.into(),
            message: message.into(),
        }
    }
}

/// Registration problems in a [`crate::ConverterRegistry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("converter '{0}' is already registered")]
    DuplicateConverter(String),

    #[error("converter names cannot be empty")]
    EmptyName,

    #[error("unknown converter '{0}'")]
    UnknownConverter(String),
}
