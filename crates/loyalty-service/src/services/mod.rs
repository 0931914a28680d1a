//! Domain services.
//!
//! Each service encapsulates the business rules for one aggregate on top of
//! the storage gateway. Services return domain results: hard failures
//! (validation, not-found, conflicts) as [`loyalty_core::LoyaltyError`], and
//! business-rule declines (not enough points, illegal transition, out of
//! stock) as `Ok(false)` / `Ok(None)` so callers can branch without
//! exception-handling overhead.

pub mod member;
pub mod order;
pub mod product;
pub mod reward;

pub use member::MemberService;
pub use order::{NewOrder, OrderLine, OrderService};
pub use product::ProductService;
pub use reward::RewardService;

use loyalty_core::{LoyaltyError, Result};

/// Reject blank (empty or whitespace-only) required fields.
fn require_non_blank(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LoyaltyError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}

/// Shorthand for a domain not-found error.
fn not_found(entity: &'static str, id: impl ToString) -> LoyaltyError {
    LoyaltyError::NotFound {
        entity,
        id: id.to_string(),
    }
}
