//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient points.
    #[error("insufficient points: balance={balance}, required={required}")]
    InsufficientPoints {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Insufficient product stock.
    #[error("insufficient stock for product {product_id}: available={available}, requested={requested}")]
    InsufficientStock {
        /// The product short on stock.
        product_id: String,
        /// Units currently in stock.
        available: u32,
        /// Units requested.
        requested: u32,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientPoints { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_points",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::InsufficientStock {
                product_id,
                available,
                requested,
            } => (
                StatusCode::CONFLICT,
                "insufficient_stock",
                self.to_string(),
                Some(serde_json::json!({
                    "product_id": product_id,
                    "available": available,
                    "requested": requested
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<loyalty_store::StoreError> for ApiError {
    fn from(err: loyalty_store::StoreError) -> Self {
        match err {
            loyalty_store::StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            loyalty_store::StoreError::EmailTaken { email } => {
                Self::Conflict(format!("email already registered: {email}"))
            }
            loyalty_store::StoreError::Conflict(msg) => Self::Conflict(msg),
            loyalty_store::StoreError::InsufficientPoints { balance, required } => {
                Self::InsufficientPoints { balance, required }
            }
            loyalty_store::StoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => Self::InsufficientStock {
                product_id,
                available,
                requested,
            },
            loyalty_store::StoreError::Database(msg)
            | loyalty_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<loyalty_core::LoyaltyError> for ApiError {
    fn from(err: loyalty_core::LoyaltyError) -> Self {
        match err {
            loyalty_core::LoyaltyError::Validation(msg) => Self::BadRequest(msg),
            loyalty_core::LoyaltyError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            loyalty_core::LoyaltyError::Conflict(msg) => Self::Conflict(msg),
            loyalty_core::LoyaltyError::InsufficientPoints { balance, required } => {
                Self::InsufficientPoints { balance, required }
            }
            loyalty_core::LoyaltyError::InsufficientStock {
                product_id,
                available,
                requested,
            } => Self::InsufficientStock {
                product_id,
                available,
                requested,
            },
            loyalty_core::LoyaltyError::InvalidId(e) => Self::BadRequest(e.to_string()),
            loyalty_core::LoyaltyError::Storage(msg)
            | loyalty_core::LoyaltyError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
