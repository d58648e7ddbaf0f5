//! Capture-pattern extraction for the regex stage.
//!
//! A pattern yields its first capture group, or the whole match when it has
//! no group. Patterns may also end in a sed-style replacement such as
//! `.*router=(\d+).*/$1`; the part after the last unescaped `/` is then used
//! as an expansion template over the captures.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::value::StagedValue;

static GROUP_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+|\{\w+\})").expect("valid group reference regex"));

/// A compiled extraction pattern.
#[derive(Debug, Clone)]
pub struct CapturePattern {
    source: String,
    regex: Regex,
    replacement: Option<String>,
}

impl CapturePattern {
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let (expression, replacement) = split_replacement(pattern);
        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(expression)?,
            replacement: replacement.map(str::to_string),
        })
    }

    /// The pattern as written, replacement suffix included.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn has_replacement(&self) -> bool {
        self.replacement.is_some()
    }

    pub fn extract(&self, input: &str) -> Option<String> {
        let captures = self.regex.captures(input)?;
        if let Some(template) = &self.replacement {
            if !references_any_match(&captures, template) {
                return None;
            }
            let mut expanded = String::new();
            captures.expand(template, &mut expanded);
            return Some(expanded);
        }
        let group = if self.regex.captures_len() > 1 { 1 } else { 0 };
        captures.get(group).map(|found| found.as_str().to_string())
    }

    /// Applies the pattern to a staged value. Null stays null and error
    /// markers pass through untouched.
    pub fn extract_staged(&self, value: &StagedValue) -> StagedValue {
        match value {
            StagedValue::Text(text) => self.extract(text).map(StagedValue::Text).unwrap_or_default(),
            other => other.clone(),
        }
    }
}

/// Compiles `pattern` and applies it to `raw` in one step.
pub fn extract(raw: Option<&str>, pattern: &str) -> Result<Option<String>, regex::Error> {
    let compiled = CapturePattern::compile(pattern)?;
    Ok(raw.and_then(|input| compiled.extract(input)))
}

/// Whether at least one group named in `template` took part in the match.
fn references_any_match(captures: &Captures<'_>, template: &str) -> bool {
    GROUP_REFERENCE.captures_iter(template).any(|reference| {
        let name = reference[1].trim_start_matches('{').trim_end_matches('}');
        match name.parse::<usize>() {
            Ok(index) => captures.get(index).is_some(),
            Err(_) => captures.name(name).is_some(),
        }
    })
}

/// Splits `pattern/$1` into the expression and its replacement template. A
/// trailing segment without a group reference is part of the expression.
fn split_replacement(pattern: &str) -> (&str, Option<&str>) {
    let mut escaped = false;
    let mut split_at = None;
    for (offset, ch) in pattern.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => split_at = Some(offset),
            _ => {}
        }
    }

    match split_at {
        Some(offset) if GROUP_REFERENCE.is_match(&pattern[offset + 1..]) => {
            (&pattern[..offset], Some(&pattern[offset + 1..]))
        }
        _ => (pattern, None),
    }
}
