//! # HTTP response helpers
//!
//! Turning controller responses into JSON documents, with errors that carry
//! enough context to debug a misconfigured URI or an unexpected payload.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of characters of a response body kept in error messages.
pub const BODY_PREVIEW_LIMIT: usize = 200;

/// Return a user-friendly hint for common controller status codes.
///
/// # Example
/// ```rust
/// use odl_util::http::status_error_message;
///
/// let unauthorized = status_error_message(401).unwrap();
/// assert!(unauthorized.contains("Unauthorized"));
///
/// let missing = status_error_message(404).unwrap();
/// assert!(missing.contains("uri"));
///
/// assert!(status_error_message(500).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: the controller requires credentials for this resource".into()),
        403 => Some("Forbidden (403). Hint: check the controller's AAA configuration for this user".into()),
        404 => Some("Not Found (404). Hint: check the query uri against the controller's RESTCONF tree".into()),
        409 => Some("Conflict (409). Hint: the requested data node may not exist in the operational datastore yet".into()),
        _ => None,
    }
}

/// Parse HTTP response text into JSON, providing detailed errors on failure.
///
/// The error carries the HTTP status (when known) and up to
/// [`BODY_PREVIEW_LIMIT`] characters of the body with whitespace collapsed,
/// which is usually enough to spot an HTML error page or a truncated payload.
///
/// # Example
/// ```rust
/// use odl_util::http::parse_response_json_strict;
///
/// let value = parse_response_json_strict(r#"{"topology": []}"#, None).unwrap();
/// assert!(value["topology"].is_array());
///
/// let error = parse_response_json_strict("<html>login</html>", None).unwrap_err();
/// assert_eq!(error.body_preview(), "<html>login</html>");
/// ```
pub fn parse_response_json_strict(text: &str, status: Option<StatusCode>) -> Result<Value, JsonParseError> {
    serde_json::from_str::<Value>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        JsonParseError::new(status_note, error, response_preview(text))
    })
}

/// Collapse whitespace and truncate a response body for log and error output.
pub fn response_preview(text: &str) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for (count, ch) in text.chars().enumerate() {
        if count >= BODY_PREVIEW_LIMIT {
            preview.push_str("...");
            break;
        }
        if ch.is_whitespace() {
            if !preview.ends_with(' ') {
                preview.push(' ');
            }
        } else {
            preview.push(ch);
        }
    }

    preview.trim().to_string()
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    /// Access the truncated response preview captured during parsing.
    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_reports_status_in_message() {
        let error = parse_response_json_strict("not json", Some(StatusCode::OK)).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("status 200 OK"), "message: {message}");
        assert!(message.contains("not json"), "message: {message}");
    }

    #[test]
    fn preview_collapses_whitespace_and_truncates() {
        let body = format!("{{\n\t\"a\":   1,{}", "x".repeat(400));
        let preview = response_preview(&body);
        assert!(preview.starts_with("{ \"a\": 1,"));
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn empty_body_preview_is_marked() {
        assert_eq!(response_preview("  \n"), "<empty>");
    }
}
