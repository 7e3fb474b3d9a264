use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name to the validation messages reported for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Rejection payload returned by the API: `{status, message, errors?}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// HTTP status echoed by the server, when present.
    #[serde(default)]
    pub status: Option<u16>,
    /// The main error message.
    #[serde(default)]
    pub message: String,
    /// Per-field validation errors (422 responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorBody {
    /// Creates an error body with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            errors: None,
        }
    }

    /// `true` if the body carries at least one field error.
    #[must_use]
    pub fn has_field_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_validation_payload() {
        let json = r#"{"status":422,"message":"The given data was invalid.","errors":{"email":["The email field is required."]}}"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.status, Some(422));
        assert!(body.has_field_errors());
        assert_eq!(
            body.errors.unwrap()["email"],
            vec!["The email field is required.".to_string()]
        );
    }

    #[test]
    fn missing_fields_default() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body, ErrorBody::default());
        assert!(!body.has_field_errors());
    }
}
