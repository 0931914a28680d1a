//! Error types for the loyalty platform.

use crate::ids::IdError;

/// Result type for loyalty domain operations.
pub type Result<T> = std::result::Result<T, LoyaltyError>;

/// Errors that can occur in loyalty domain operations.
#[derive(Debug, thiserror::Error)]
pub enum LoyaltyError {
    /// Malformed input (blank required string, non-positive cost, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// Uniqueness violation or an illegal state transition request.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Not enough points for the requested operation.
    #[error("insufficient points: balance={balance}, required={required}")]
    InsufficientPoints {
        /// Current points balance.
        balance: i64,
        /// Points required by the operation.
        required: i64,
    },

    /// Not enough stock for the requested quantity.
    #[error("insufficient stock for product {product_id}: available={available}, requested={requested}")]
    InsufficientStock {
        /// The product that is short on stock.
        product_id: String,
        /// Units currently in stock.
        available: u32,
        /// Units requested.
        requested: u32,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
