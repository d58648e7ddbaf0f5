use std::net::Ipv4Addr;

use tracing::warn;

use super::{AggregateConverter, RowConverter};
use crate::error::ConversionError;
use crate::value::{StagedRow, StagedValue};

pub const INT2IP_CONVERTER: &str = "int2ip";
pub const SUM_CONVERTER: &str = "sum";

/// `none`: returns the value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl RowConverter for Passthrough {
    fn convert(&self, value: &str, _row: &StagedRow) -> Result<String, ConversionError> {
        Ok(value.to_string())
    }
}

/// `int2ip`: an unsigned 32-bit integer rendered as a dotted quad, most
/// significant byte first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int2Ip;

impl RowConverter for Int2Ip {
    fn convert(&self, value: &str, _row: &StagedRow) -> Result<String, ConversionError> {
        int_to_ip(value)
    }
}

pub fn int_to_ip(value: &str) -> Result<String, ConversionError> {
    let number = value.trim().parse::<u32>().map_err(|_| {
        ConversionError::new(INT2IP_CONVERTER, format!("'{value}' is not an unsigned 32-bit integer"))
    })?;
    Ok(Ipv4Addr::from(number).to_string())
}

/// `sum`: numeric total of a column. Values that are not numbers are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl AggregateConverter for Sum {
    fn aggregate(&self, column: &str, values: &[StagedValue]) -> Result<String, ConversionError> {
        let mut total = 0.0;
        for (row, value) in values.iter().enumerate() {
            match value {
                StagedValue::Text(text) => match crate::value::parse_number(text) {
                    Some(number) => total += number,
                    None => warn!(column, row, value = %text, "sum skipped a non-numeric value"),
                },
                StagedValue::Null => warn!(column, row, "sum skipped a null value"),
                StagedValue::Error(error) => warn!(column, row, %error, "sum skipped a conversion error"),
            }
        }
        Ok(format_number(total))
    }
}

/// Renders integral values without a fractional part (`6`, not `6.0`).
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}
