//! Structured API error responses with error codes
//!
//! Every failure surfaces as a machine-readable code plus a human-readable
//! message; clients key on the code, never on the message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::infra::RegistryError;

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error
/// handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    /// Request body is malformed
    InvalidRequestBody,
    /// Field value is invalid
    InvalidFieldValue,
    /// Creation window is inverted or already elapsed
    InvalidWindow,

    // Resource errors
    /// Conference not found
    ConferenceNotFound,

    // Conflict errors
    /// Conference id already taken
    AlreadyExists,
    /// Claim arrived outside the conference window
    WindowClosed,
    /// Stream key already revealed
    AlreadyRevealed,
    /// Conference already ended
    AlreadyEnded,
    /// Conference window has not elapsed yet
    StillActive,

    // Authorization errors
    /// Caller is not the record's creator
    Forbidden,

    // Proof errors
    /// Provider rejected the encrypted input
    InvalidEncryptionProof,
    /// Provider rejected the decryption claim
    InvalidDecryptionProof,

    // Infrastructure errors
    /// Database operation failed
    DatabaseError,
    /// FHE provider unreachable or misbehaving
    GatewayError,
    /// Internal server error
    InternalError,
}

/// API error with status, code, and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with `INVALID_FIELD_VALUE`, for request parsing failures
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidFieldValue,
            message,
        )
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let (status, code) = match &err {
            RegistryError::AlreadyExists(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyExists),
            RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::ConferenceNotFound),
            RegistryError::InvalidWindow { .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidWindow)
            }
            RegistryError::WindowClosed { .. } => (StatusCode::CONFLICT, ErrorCode::WindowClosed),
            RegistryError::AlreadyRevealed(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyRevealed),
            RegistryError::InvalidEncryptionProof(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidEncryptionProof)
            }
            RegistryError::InvalidDecryptionProof(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidDecryptionProof)
            }
            RegistryError::Forbidden { .. } => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            RegistryError::StillActive { .. } => (StatusCode::CONFLICT, ErrorCode::StillActive),
            RegistryError::AlreadyEnded(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyEnded),
            RegistryError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError)
            }
            RegistryError::Gateway(_) => (StatusCode::BAD_GATEWAY, ErrorCode::GatewayError),
            RegistryError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            }
        };

        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}
