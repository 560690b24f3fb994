//! JSON error envelope shared by the BFF and the storefront.

use serde::{Deserialize, Serialize};

/// Error body returned by every failing BFF endpoint.
///
/// ```json
/// { "code": "NotFound", "message": "Cart not found: abc", "errors": [] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable summary.
    pub message: String,
    /// Individual failures, e.g. vendor validation errors.
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// A single error entry inside an [`ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    /// Offending input field, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorBody {
    /// Create an error body without details.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Attach details.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorDetail>) -> Self {
        self.errors = errors;
        self
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_default_when_missing() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"code":"BadRequest","message":"nope"}"#).unwrap();
        assert!(body.errors.is_empty());
        assert_eq!(body.to_string(), "BadRequest: nope");
    }

    #[test]
    fn test_field_omitted_when_none() {
        let body = ErrorBody::new("RequiredField", "cart_id is required").with_errors(vec![
            ErrorDetail {
                code: "RequiredField".to_string(),
                message: "cart_id is required".to_string(),
                field: None,
            },
        ]);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["errors"][0].get("field").is_none());
    }
}
