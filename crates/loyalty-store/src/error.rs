//! Error types for loyalty storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// Unique email constraint violated.
    #[error("email already registered: {email}")]
    EmailTaken {
        /// The email that is already in use.
        email: String,
    },

    /// The record is in a state that forbids the operation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient points for a deduction.
    #[error("insufficient points: balance={balance}, required={required}")]
    InsufficientPoints {
        /// Current points balance.
        balance: i64,
        /// Points required by the operation.
        required: i64,
    },

    /// Insufficient product stock for an order line.
    #[error("insufficient stock for product {product_id}: available={available}, requested={requested}")]
    InsufficientStock {
        /// The product that is short on stock.
        product_id: String,
        /// Units currently in stock.
        available: u32,
        /// Units requested.
        requested: u32,
    },
}

impl StoreError {
    /// Shorthand for a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for loyalty_core::LoyaltyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(msg) => Self::Storage(msg),
            StoreError::Serialization(msg) => Self::Serialization(msg),
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::EmailTaken { email } => {
                Self::Conflict(format!("email already registered: {email}"))
            }
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::InsufficientPoints { balance, required } => {
                Self::InsufficientPoints { balance, required }
            }
            StoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => Self::InsufficientStock {
                product_id,
                available,
                requested,
            },
        }
    }
}
