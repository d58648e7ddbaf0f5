//! # Path expressions
//!
//! Addresses nested object keys and array indices inside a JSON document.
//! Three spellings are accepted and can be mixed:
//!
//! - dotted with bracket indices: `topology[0].link`
//! - slash separated, as RESTCONF paths are usually written:
//!   `network-topology:network-topology/topology[0]/link`
//! - JSONPath bracket chains: `$["network-topology:network-topology"]["topology"][0]`
//!
//! A numeric dotted segment (`topology.0.link`) also indexes into arrays.
//! An empty path, `$`, `.` or `/` addresses the node itself.
//!
//! Resolution never fails: a missing key, an out-of-range index, or an attempt
//! to descend into a scalar all yield `None`. Only parsing can fail, and that is
//! reported once per query.
//!
//! ```rust
//! use odl_engine::path::JsonPath;
//! use serde_json::json;
//!
//! let document = json!({"topology": [{"link": [{"link-id": "l1"}]}]});
//! let path = JsonPath::parse("topology[0]/link[0]/link-id")?;
//! assert_eq!(path.resolve(&document), Some(&json!("l1")));
//! assert_eq!(JsonPath::parse("topology[3].link")?.resolve(&document), None);
//! # Ok::<(), odl_engine::path::PathSyntaxError>(())
//! ```

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Offsets are byte offsets into the trimmed expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathSyntaxError {
    #[error("empty segment after separator at offset {0}")]
    EmptySegment(usize),

    #[error("unterminated '[' at offset {0}")]
    UnterminatedBracket(usize),

    #[error("unterminated quoted key starting at offset {0}")]
    UnterminatedQuote(usize),

    #[error("invalid array index '{text}' at offset {offset}")]
    InvalidIndex { text: String, offset: usize },

    #[error("unexpected '{character}' at offset {offset}")]
    UnexpectedCharacter { character: char, offset: usize },

    #[error("wildcard segments are not supported (offset {0})")]
    Wildcard(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A parsed path expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self, PathSyntaxError> {
        let trimmed = expression.trim();
        let body = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let base = trimmed.len() - body.len();
        let chars: Vec<(usize, char)> = body.char_indices().map(|(offset, ch)| (offset + base, ch)).collect();

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut key_start = base;
        let mut pending_separator: Option<usize> = None;
        let mut cursor = 0;

        while let Some(&(offset, ch)) = chars.get(cursor) {
            match ch {
                '.' | '/' => {
                    if !key.is_empty() {
                        push_key(&mut segments, &mut key, key_start)?;
                    } else if let Some(previous) = pending_separator {
                        return Err(PathSyntaxError::EmptySegment(previous));
                    }
                    pending_separator = Some(offset);
                    cursor += 1;
                }
                '[' => {
                    if !key.is_empty() {
                        push_key(&mut segments, &mut key, key_start)?;
                    }
                    let (segment, next) = parse_bracket(&chars, cursor)?;
                    segments.push(segment);
                    pending_separator = None;
                    cursor = next;
                }
                ']' => return Err(PathSyntaxError::UnexpectedCharacter { character: ch, offset }),
                _ => {
                    if key.is_empty() {
                        key_start = offset;
                    }
                    key.push(ch);
                    pending_separator = None;
                    cursor += 1;
                }
            }
        }

        if !key.is_empty() {
            push_key(&mut segments, &mut key, key_start)?;
        } else if let Some(offset) = pending_separator
            && !segments.is_empty()
        {
            return Err(PathSyntaxError::EmptySegment(offset));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walks `value` along the path. An explicit JSON `null` at the end is
    /// returned as `Some(Value::Null)`.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for JsonPath {
    /// Canonical JSONPath spelling, e.g. `$.topology[0]["source-node"]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) if is_plain_key(key) => write!(f, ".{key}")?,
                PathSegment::Key(key) => write!(f, "[\"{}\"]", key.replace('\\', "\\\\").replace('"', "\\\""))?,
            }
        }
        Ok(())
    }
}

/// Parses and resolves in one step.
pub fn resolve<'a>(document: &'a Value, expression: &str) -> Result<Option<&'a Value>, PathSyntaxError> {
    Ok(JsonPath::parse(expression)?.resolve(document))
}

fn is_plain_key(key: &str) -> bool {
    key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn push_key(segments: &mut Vec<PathSegment>, key: &mut String, offset: usize) -> Result<(), PathSyntaxError> {
    if key == "*" {
        return Err(PathSyntaxError::Wildcard(offset));
    }
    segments.push(PathSegment::Key(std::mem::take(key)));
    Ok(())
}

/// Parses `[0]`, `["key"]` or `['key']` starting at the `[` in `chars[start]`.
/// Returns the segment and the position after the closing `]`.
fn parse_bracket(chars: &[(usize, char)], start: usize) -> Result<(PathSegment, usize), PathSyntaxError> {
    let open_offset = chars[start].0;
    let mut cursor = skip_whitespace(chars, start + 1);

    let Some(&(first_offset, first)) = chars.get(cursor) else {
        return Err(PathSyntaxError::UnterminatedBracket(open_offset));
    };

    if first == '"' || first == '\'' {
        let quote = first;
        let mut key = String::new();
        cursor += 1;
        loop {
            match chars.get(cursor) {
                None => return Err(PathSyntaxError::UnterminatedQuote(first_offset)),
                Some(&(_, '\\')) => {
                    let Some(&(_, escaped)) = chars.get(cursor + 1) else {
                        return Err(PathSyntaxError::UnterminatedQuote(first_offset));
                    };
                    key.push(escaped);
                    cursor += 2;
                }
                Some(&(_, ch)) if ch == quote => {
                    cursor += 1;
                    break;
                }
                Some(&(_, ch)) => {
                    key.push(ch);
                    cursor += 1;
                }
            }
        }
        cursor = skip_whitespace(chars, cursor);
        return match chars.get(cursor) {
            Some(&(_, ']')) => Ok((PathSegment::Key(key), cursor + 1)),
            Some(&(offset, character)) => Err(PathSyntaxError::UnexpectedCharacter { character, offset }),
            None => Err(PathSyntaxError::UnterminatedBracket(open_offset)),
        };
    }

    let mut text = String::new();
    loop {
        match chars.get(cursor) {
            None => return Err(PathSyntaxError::UnterminatedBracket(open_offset)),
            Some(&(_, ']')) => break,
            Some(&(_, ch)) => {
                text.push(ch);
                cursor += 1;
            }
        }
    }
    let text = text.trim();
    if text == "*" {
        return Err(PathSyntaxError::Wildcard(first_offset));
    }
    let index = text.parse::<usize>().map_err(|_| PathSyntaxError::InvalidIndex {
        text: text.to_string(),
        offset: first_offset,
    })?;
    Ok((PathSegment::Index(index), cursor + 1))
}

fn skip_whitespace(chars: &[(usize, char)], mut cursor: usize) -> usize {
    while chars.get(cursor).is_some_and(|(_, ch)| ch.is_whitespace()) {
        cursor += 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn topology() -> Value {
        json!({
            "network-topology:network-topology": {
                "topology": [
                    {
                        "topology-id": "flow:1",
                        "link": [
                            {"link-id": "l1", "source": {"source-node": "openflow:router=16909060"}},
                            {"link-id": "l2", "source": {}}
                        ]
                    }
                ]
            }
        })
    }

    #[test]
    fn slash_dotted_and_bracket_spellings_agree() {
        let document = topology();
        let expected = json!("openflow:router=16909060");
        for expression in [
            "network-topology:network-topology/topology[0]/link[0]/source/source-node",
            "network-topology:network-topology.topology[0].link[0].source.source-node",
            r#"$["network-topology:network-topology"]["topology"][0]["link"][0]["source"]["source-node"]"#,
            "$.network-topology:network-topology.topology.0.link.0.source.source-node",
            "network-topology:network-topology/topology/0/link/0/source/source-node",
        ] {
            assert_eq!(resolve(&document, expression).unwrap(), Some(&expected), "expression: {expression}");
        }
    }

    #[test]
    fn gaps_resolve_to_none() {
        let document = topology();
        let root = "network-topology:network-topology/topology[0]";
        assert_eq!(resolve(&document, &format!("{root}/link[1]/source/source-node")).unwrap(), None);
        assert_eq!(resolve(&document, &format!("{root}/link[9]")).unwrap(), None);
        assert_eq!(resolve(&document, "missing/key").unwrap(), None);
    }

    #[test]
    fn descending_into_a_scalar_yields_none() {
        let document = topology();
        let path = "network-topology:network-topology/topology[0]/topology-id/deeper";
        assert_eq!(resolve(&document, path).unwrap(), None);
        assert_eq!(resolve(&json!("text"), "[0]").unwrap(), None);
    }

    #[test]
    fn root_spellings_address_the_node_itself() {
        let document = json!(["a", "b"]);
        for expression in ["", "$", ".", "/", "  $  "] {
            let path = JsonPath::parse(expression).unwrap();
            assert!(path.is_root(), "expression: {expression:?}");
            assert_eq!(path.resolve(&document), Some(&document));
        }
    }

    #[test]
    fn explicit_null_is_returned_as_null() {
        let document = json!({"a": null});
        assert_eq!(resolve(&document, "a").unwrap(), Some(&Value::Null));
    }

    #[test]
    fn quoted_keys_support_escapes_and_separators() {
        let document = json!({"a.b/c": {"say \"hi\"": 1}});
        let path = JsonPath::parse(r#"$['a.b/c']["say \"hi\""]"#).unwrap();
        assert_eq!(path.resolve(&document), Some(&json!(1)));
    }

    #[test]
    fn syntax_errors_are_reported_with_offsets() {
        assert_eq!(JsonPath::parse("a..b"), Err(PathSyntaxError::EmptySegment(1)));
        assert_eq!(JsonPath::parse("a/"), Err(PathSyntaxError::EmptySegment(1)));
        assert_eq!(JsonPath::parse("topology[0"), Err(PathSyntaxError::UnterminatedBracket(8)));
        assert_eq!(JsonPath::parse(r#"$["open"#), Err(PathSyntaxError::UnterminatedQuote(2)));
        assert!(matches!(JsonPath::parse("link[-1]"), Err(PathSyntaxError::InvalidIndex { .. })));
        assert!(matches!(JsonPath::parse("link[first]"), Err(PathSyntaxError::InvalidIndex { .. })));
        assert!(matches!(JsonPath::parse("a]"), Err(PathSyntaxError::UnexpectedCharacter { character: ']', .. })));
        assert_eq!(JsonPath::parse("link[*]"), Err(PathSyntaxError::Wildcard(5)));
        assert_eq!(JsonPath::parse("link/*/id"), Err(PathSyntaxError::Wildcard(5)));
    }

    #[test]
    fn display_uses_canonical_jsonpath() {
        let path = JsonPath::parse("network-topology:network-topology/topology[0]/link").unwrap();
        assert_eq!(path.to_string(), r#"$["network-topology:network-topology"].topology[0].link"#);
    }
}
