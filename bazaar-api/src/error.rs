/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts to the matching
/// status code with a structured body. Business-rule violations are caught at
/// this boundary; no raw internal failure surfaces for a well-formed request.
///
/// # Taxonomy
///
/// - `ValidationError` → 400 with field-keyed details
/// - `Unauthorized` → 401 (missing or invalid credentials)
/// - `Forbidden` → 403 (authenticated but insufficient role)
/// - `NotFound` → 404
/// - 405 is produced by the router's method dispatch, not by this type
/// - `InternalError` → 500, details logged but not echoed to clients

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Validation failure (400) with per-field details
    ValidationError(Vec<FieldError>),

    /// Internal server error (500)
    InternalError(String),
}

/// A single field-level validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation (`non_field_errors` for cross-field rules)
    pub field: String,

    /// Error message
    pub message: String,
}

impl FieldError {
    /// Creates a field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_error", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level details, present for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    /// Validation error for a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![FieldError::new(field, message)])
    }

    /// Validation error not tied to a specific field
    pub fn non_field(message: impl Into<String>) -> Self {
        ApiError::field("non_field_errors", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert declarative payload validation failures to field-keyed 400s
impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let errors: Vec<FieldError> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    }
}

/// Convert sqlx errors to API errors
///
/// Unique-constraint violations are translated to the same field-keyed 400s
/// the application-level pre-checks produce, so a concurrent duplicate that
/// slips past a pre-check is reported identically.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Not found.".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("username") {
                        return ApiError::field(
                            "username",
                            "A user with that username already exists.",
                        );
                    }
                    if constraint.contains("email") {
                        return ApiError::field("email", "A user with that email already exists.");
                    }
                    if constraint.contains("reviews_product_id_user_id") {
                        return ApiError::non_field(
                            "You have already submitted a review for this product.",
                        );
                    }
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert credential-resolution failures to 401s
impl From<bazaar_shared::auth::middleware::AuthError> for ApiError {
    fn from(err: bazaar_shared::auth::middleware::AuthError) -> Self {
        use bazaar_shared::auth::middleware::AuthError;
        match err {
            AuthError::MissingCredentials | AuthError::InvalidToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::DatabaseError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert policy denials to 403s
impl From<bazaar_shared::auth::policy::PolicyError> for ApiError {
    fn from(_: bazaar_shared::auth::policy::PolicyError) -> Self {
        ApiError::Forbidden("You do not have permission to perform this action.".to_string())
    }
}

/// Convert password errors to API errors
impl From<bazaar_shared::auth::password::PasswordError> for ApiError {
    fn from(err: bazaar_shared::auth::password::PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_shared::auth::middleware::AuthError;
    use bazaar_shared::auth::policy::{require, Action, Role};

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("Not found.".to_string());
        assert_eq!(err.to_string(), "Not found: Not found.");

        let err = ApiError::field("email", "Enter a valid email address.");
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
    }

    #[test]
    fn test_field_helpers() {
        let err = ApiError::non_field("You have already submitted a review for this product.");
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "non_field_errors");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_auth_error_maps_to_unauthorized() {
        let err: ApiError = AuthError::MissingCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err: ApiError = AuthError::InvalidToken.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_policy_error_maps_to_forbidden() {
        let denial = require(Role::Authenticated, Action::WriteCatalog).unwrap_err();
        let err: ApiError = denial.into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
