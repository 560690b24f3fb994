//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors are rendered as the
//! JSON envelope `{code, message, errors[]}`; server errors are captured to
//! Sentry and their details are not exposed to the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shopfront_core::{ErrorBody, ErrorDetail};
use thiserror::Error;

use crate::commerce::CommerceError;
use crate::payments::PaymentError;

/// Application-level error type for the BFF.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required request field is missing or blank.
    #[error("{0} is required")]
    RequiredField(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Commerce platform call failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Payment gateway call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// Vendor errors keep the upstream status when they carry one.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let upstream = match self {
            Self::RequiredField(_) | Self::BadRequest(_) => return StatusCode::BAD_REQUEST,
            Self::NotFound(_) => return StatusCode::NOT_FOUND,
            Self::Internal(_) => return StatusCode::INTERNAL_SERVER_ERROR,
            Self::Commerce(err) => err.status(),
            Self::Payment(err) => err.status(),
        };
        upstream
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn code(&self, status: StatusCode) -> &'static str {
        match self {
            Self::RequiredField(_) => "RequiredField",
            Self::BadRequest(_) => "BadRequest",
            Self::NotFound(_) => "NotFound",
            Self::Commerce(CommerceError::ConcurrentModification { .. }) => "ConcurrentModification",
            _ if status == StatusCode::NOT_FOUND => "NotFound",
            _ if status.is_client_error() => "BadRequest",
            _ => "InternalServerError",
        }
    }

    /// Vendor details passed through for client errors.
    fn details(&self) -> Vec<ErrorDetail> {
        match self {
            Self::RequiredField(field) => vec![ErrorDetail {
                code: "RequiredField".to_string(),
                message: self.to_string(),
                field: Some(field.clone()),
            }],
            Self::Commerce(err) => err
                .details()
                .iter()
                .map(|item| ErrorDetail {
                    code: item.code.clone(),
                    message: item.message.clone(),
                    field: item.field.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Client-facing message.
    fn message(&self) -> String {
        match self {
            Self::RequiredField(_) => self.to_string(),
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Commerce(CommerceError::Api { body, .. }) => body.message.clone(),
            Self::Commerce(CommerceError::NotFound(msg)) => msg.clone(),
            Self::Commerce(CommerceError::ConcurrentModification { .. }) => {
                "The cart was modified concurrently, please retry".to_string()
            }
            Self::Payment(PaymentError::Api { message, .. }) => message.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status.is_server_error() {
            // Capture server errors to Sentry
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = %status,
                sentry_event_id = %event_id,
                "Request error"
            );
            // Don't expose internal error details to clients
            ErrorBody::new("InternalServerError", "Internal server error")
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
            ErrorBody::new(self.code(status), self.message()).with_errors(self.details())
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Fail with `RequiredField` if a string field is blank.
///
/// # Errors
///
/// Returns `AppError::RequiredField` naming `field`.
pub fn require<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::RequiredField(field.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commerce::types::{ApiErrorItem, ApiErrorResponse};

    async fn body_of(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Cart not found: abc".to_string());
        assert_eq!(err.to_string(), "Not found: Cart not found: abc");

        let err = AppError::RequiredField("cart_id".to_string());
        assert_eq!(err.to_string(), "cart_id is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::RequiredField("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Commerce(CommerceError::Auth("denied".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Payment(PaymentError::Api {
                status: 422,
                message: "invalid".to_string()
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_required_field_body() {
        let (status, body) = body_of(AppError::RequiredField("cart_id".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "RequiredField");
        assert_eq!(body.message, "cart_id is required");
        assert_eq!(body.errors[0].field.as_deref(), Some("cart_id"));
    }

    #[tokio::test]
    async fn test_vendor_client_error_passes_details() {
        let err = AppError::Commerce(CommerceError::Api {
            status: 400,
            body: ApiErrorResponse {
                status_code: 400,
                message: "The discount code 'NOPE' was not found.".to_string(),
                errors: vec![ApiErrorItem {
                    code: "DiscountCodeNonApplicable".to_string(),
                    message: "The discount code 'NOPE' was not found.".to_string(),
                    current_version: None,
                    field: None,
                }],
            },
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "BadRequest");
        assert_eq!(body.errors[0].code, "DiscountCodeNonApplicable");
    }

    #[tokio::test]
    async fn test_conflict_is_surfaced() {
        let err = AppError::Commerce(CommerceError::ConcurrentModification {
            current_version: Some(3),
            body: ApiErrorResponse {
                status_code: 409,
                message: "Version mismatch".to_string(),
                errors: Vec::new(),
            },
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.code, "ConcurrentModification");
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let err = AppError::Commerce(CommerceError::Api {
            status: 503,
            body: ApiErrorResponse {
                status_code: 503,
                message: "upstream secret detail".to_string(),
                errors: Vec::new(),
            },
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.message, "Internal server error");
        assert!(body.errors.is_empty());
    }

    #[test]
    fn test_require() {
        assert_eq!(require("  abc ", "cart_id").unwrap(), "abc");
        assert!(matches!(
            require("   ", "cart_id"),
            Err(AppError::RequiredField(field)) if field == "cart_id"
        ));
    }
}
