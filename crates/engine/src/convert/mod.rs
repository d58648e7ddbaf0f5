//! # Value converters
//!
//! Converters are named transforms applied after the regex stage. They come in
//! two flavours:
//!
//! - **per-row** ([`RowConverter`]): map one value to another, with read-only
//!   access to the columns of the same row built so far;
//! - **aggregate** ([`AggregateConverter`]): see every row's value of a column
//!   and produce a single value, written back into each row once all rows are
//!   built.
//!
//! The [`ConverterRegistry`] holds them by name and ships the built-ins
//! `none`, `int2ip` and `sum`.

mod builtin;
mod registry;

use std::fmt;
use std::sync::Arc;

pub use builtin::{INT2IP_CONVERTER, Int2Ip, Passthrough, SUM_CONVERTER, Sum, format_number, int_to_ip};
pub use registry::ConverterRegistry;

use crate::error::ConversionError;
use crate::value::{StagedRow, StagedValue};

/// Transforms a single text value.
///
/// Null and error inputs never reach a row converter; the registry passes
/// them through unchanged.
pub trait RowConverter: Send + Sync {
    fn convert(&self, value: &str, row: &StagedRow) -> Result<String, ConversionError>;
}

impl<F> RowConverter for F
where
    F: Fn(&str, &StagedRow) -> Result<String, ConversionError> + Send + Sync,
{
    fn convert(&self, value: &str, row: &StagedRow) -> Result<String, ConversionError> {
        self(value, row)
    }
}

/// Reduces one column across every built row to a single value.
pub trait AggregateConverter: Send + Sync {
    fn aggregate(&self, column: &str, values: &[StagedValue]) -> Result<String, ConversionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    PerRow,
    Aggregate,
}

/// A registered converter together with its capability.
#[derive(Clone)]
pub enum Converter {
    PerRow(Arc<dyn RowConverter>),
    Aggregate(Arc<dyn AggregateConverter>),
}

impl Converter {
    pub fn per_row(converter: impl RowConverter + 'static) -> Self {
        Converter::PerRow(Arc::new(converter))
    }

    pub fn aggregate(converter: impl AggregateConverter + 'static) -> Self {
        Converter::Aggregate(Arc::new(converter))
    }

    pub fn kind(&self) -> ConverterKind {
        match self {
            Converter::PerRow(_) => ConverterKind::PerRow,
            Converter::Aggregate(_) => ConverterKind::Aggregate,
        }
    }

    /// Per-row step. Null and error values, and every value handed to an
    /// aggregate, come back unchanged.
    pub fn apply(&self, value: &StagedValue, row: &StagedRow) -> StagedValue {
        let (Converter::PerRow(converter), StagedValue::Text(text)) = (self, value) else {
            return value.clone();
        };
        match converter.convert(text, row) {
            Ok(converted) => StagedValue::Text(converted),
            Err(error) => StagedValue::Error(error),
        }
    }

    /// Aggregate step over one column of every built row. Per-row converters
    /// have no aggregate step and return `None`.
    pub fn finalize(&self, column: &str, values: &[StagedValue]) -> Option<StagedValue> {
        let Converter::Aggregate(converter) = self else {
            return None;
        };
        Some(match converter.aggregate(column, values) {
            Ok(total) => StagedValue::Text(total),
            Err(error) => StagedValue::Error(error),
        })
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Converter").field(&self.kind()).finish()
    }
}
