//! Backend error payload model.
//!
//! Every failing endpoint answers with the same JSON convention:
//! `{"error": <code>, "message": <text>}`, optionally extended with
//! `"fields"` (validation) or `"field"` (conflict). Real backends drift,
//! so parsing is tolerant: anything that does not match degrades to an
//! empty body rather than a parse error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validation failure scoped to a single input field.
///
/// Field-scoped errors are never collapsed into one string; the caller
/// renders them next to the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Parsed error payload of a failed backend call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (`"validation_error"`, `"duplicate_account"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Human-readable message, if the backend supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Field-scoped validation errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,

    /// Offending field for single-field conflicts (duplicate username/email).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorBody {
    /// Parse a raw response body.
    ///
    /// Never fails: non-JSON or unexpected shapes produce an empty body.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::default(),
        }
    }

    /// Extract the convention's fields from an already-parsed value,
    /// ignoring anything that has the wrong type.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);

        let fields = value
            .get("fields")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let field = entry.get("field")?.as_str()?.to_owned();
                        let message = entry
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("invalid value")
                            .to_owned();
                        Some(FieldError { field, message })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            error: text("error"),
            message: text("message"),
            fields,
            field: text("field"),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.message.is_none() && self.fields.is_empty() && self.field.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_code_and_message() {
        let body = ErrorBody::parse(r#"{"error":"conflict","message":"already exists"}"#);
        assert_eq!(body.code(), Some("conflict"));
        assert_eq!(body.message.as_deref(), Some("already exists"));
        assert!(body.fields.is_empty());
    }

    #[test]
    fn parses_field_scoped_errors() {
        let body = ErrorBody::parse(
            r#"{"error":"validation_error","fields":[
                {"field":"username","message":"already taken"},
                {"field":"email"}
            ]}"#,
        );
        assert_eq!(body.fields.len(), 2);
        assert_eq!(body.fields[0], FieldError::new("username", "already taken"));
        assert_eq!(body.fields[1].message, "invalid value");
    }

    #[test]
    fn wrong_shapes_degrade_to_empty() {
        assert!(ErrorBody::parse("<html>502</html>").is_empty());
        assert!(ErrorBody::parse(r#"{"error":42,"message":{"nested":true}}"#).is_empty());
        assert!(ErrorBody::parse(r#"[1,2,3]"#).is_empty());
    }

    proptest! {
        /// Property: the parser accepts arbitrary bytes-as-text without
        /// panicking, and a well-formed `message` string always survives.
        #[test]
        fn parse_never_panics(raw in ".{0,256}") {
            let _ = ErrorBody::parse(&raw);
        }

        #[test]
        fn message_round_trips(msg in "[a-zA-Z0-9 .,!]{1,64}") {
            let raw = serde_json::json!({ "message": msg }).to_string();
            let body = ErrorBody::parse(&raw);
            prop_assert_eq!(body.message.as_deref(), Some(msg.as_str()));
        }
    }
}
