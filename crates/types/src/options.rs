//! Editor-facing labels for the closed option sets.
//!
//! The engine only deals in [`Stage`], [`FilterOperation`] and converter names;
//! these tables are what a query editor shows in its select boxes.

use crate::{FilterOperation, Stage};

/// A selectable value with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionLabel {
    pub value: &'static str,
    pub label: &'static str,
}

pub const CONVERTER_OPTIONS: &[OptionLabel] = &[
    OptionLabel {
        value: "int2ip",
        label: "Integer to IP",
    },
    OptionLabel { value: "sum", label: "Sum" },
    OptionLabel { value: "none", label: "None" },
];

/// Label for a converter name; custom converters fall back to their name.
pub fn converter_label(name: &str) -> &str {
    CONVERTER_OPTIONS
        .iter()
        .find(|option| option.value == name)
        .map(|option| option.label)
        .unwrap_or(name)
}

pub fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Raw => "Raw value",
        Stage::Regex => "After regex",
        Stage::Conversion => "After conversion",
    }
}

pub fn operation_label(operation: FilterOperation) -> &'static str {
    match operation {
        FilterOperation::Equals => "Equals",
        FilterOperation::NotEquals => "Not equals",
        FilterOperation::GreaterThan => "Greater than",
        FilterOperation::LessThan => "Less than",
        FilterOperation::RegexMatch => "Matches regex",
        FilterOperation::NotRegexMatch => "Does not match regex",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_custom_converter_labels() {
        assert_eq!(converter_label("int2ip"), "Integer to IP");
        assert_eq!(converter_label("hex2mac"), "hex2mac");
    }
}
