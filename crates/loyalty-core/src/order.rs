//! Order types and lifecycle rules.
//!
//! Orders move forward through `Pending → Processing → Shipped → Delivered`,
//! with `Cancelled` reachable from any non-delivered state. Payment status is
//! an orthogonal axis. Monetary fields are integer cents; unit prices are
//! snapshots taken at order time and are decoupled from live product prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MemberId, OrderId, ProductId};

// ============================================================================
// Points conversion rates
// ============================================================================

/// Discount value of one point, in cents. 1 point = $0.01.
pub const POINTS_DISCOUNT_RATE_CENTS: i64 = 1;

/// Points earned per whole dollar of final order total.
pub const POINTS_EARNED_PER_DOLLAR: i64 = 1;

/// Compute the points earned for an order total, flooring to a whole number
/// of dollars.
#[must_use]
pub const fn points_earned_for_total(total_cents: i64) -> i64 {
    (total_cents / 100) * POINTS_EARNED_PER_DOLLAR
}

/// An order placed by a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// The order id.
    pub id: OrderId,

    /// Generated order number, unique (`ORD-YYYYMMDD-xxxxxxxx`).
    pub order_number: String,

    /// The member who placed the order.
    pub member_id: MemberId,

    /// Fulfillment status.
    pub status: OrderStatus,

    /// Payment status.
    pub payment_status: PaymentStatus,

    /// Sum of line subtotals before any discount, in cents.
    pub subtotal_cents: i64,

    /// Points discount applied, in cents. `None` means no discount was
    /// requested, as opposed to a zero-value discount.
    pub discount_cents: Option<i64>,

    /// Points deducted from the member's balance for the discount.
    pub points_used: Option<i64>,

    /// Points the member earns when the order is delivered. Computed once
    /// from the post-discount total.
    pub points_earned: Option<i64>,

    /// Final amount after discount, in cents. Never negative.
    pub total_cents: i64,

    /// Shipping address snapshot.
    pub shipping_address: String,

    /// Billing address snapshot.
    pub billing_address: String,

    /// External payment transaction id, set when payment completes.
    pub payment_transaction_id: Option<String>,

    /// When payment completed.
    pub paid_at: Option<DateTime<Utc>>,

    /// Line items.
    pub items: Vec<OrderItem>,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order with no items.
    #[must_use]
    pub fn new(member_id: MemberId, shipping_address: String, billing_address: String) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            order_number: generate_order_number(),
            member_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            subtotal_cents: 0,
            discount_cents: None,
            points_used: None,
            points_earned: None,
            total_cents: 0,
            shipping_address,
            billing_address,
            payment_transaction_id: None,
            paid_at: None,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Generate a unique order number of the form `ORD-YYYYMMDD-xxxxxxxx`.
#[must_use]
pub fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    format!("ORD-{date}-{suffix}")
}

/// A single order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product ordered.
    pub product_id: ProductId,

    /// Units ordered. Always positive.
    pub quantity: u32,

    /// Unit price snapshot at order time, in cents.
    pub unit_price_cents: i64,

    /// Points attributable to this line.
    pub points_earned: Option<i64>,
}

impl OrderItem {
    /// Line subtotal: `quantity × unit price`.
    #[must_use]
    pub fn subtotal_cents(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price_cents
    }
}

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, not yet picked up for processing.
    Pending,

    /// Order being prepared.
    Processing,

    /// Order handed to the carrier.
    Shipped,

    /// Order received by the member. Terminal; points are credited on this
    /// transition.
    Delivered,

    /// Order cancelled. Terminal; stock and points were restored.
    Cancelled,
}

impl OrderStatus {
    /// Check whether moving from `self` to `next` is a legal fulfillment
    /// transition.
    ///
    /// Fulfillment moves strictly forward; `Cancelled` is never a valid
    /// target here because cancellation has stock and points side effects
    /// and goes through its own operation.
    #[must_use]
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match (self, next) {
            (_, OrderStatus::Cancelled) | (OrderStatus::Cancelled | OrderStatus::Delivered, _) => {
                false
            }
            (current, next) => current < next,
        }
    }

    /// Check whether the order can still be cancelled.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Payment status of an order, orthogonal to fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment not yet attempted.
    Pending,

    /// Payment in flight.
    Processing,

    /// Payment completed.
    Completed,

    /// Payment failed.
    Failed,

    /// A completed payment was refunded.
    Refunded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_earned_floors_to_whole_dollars() {
        assert_eq!(points_earned_for_total(199_98), 199);
        assert_eq!(points_earned_for_total(99), 0);
        assert_eq!(points_earned_for_total(100), 1);
        assert_eq!(points_earned_for_total(0), 0);
    }

    #[test]
    fn order_number_format() {
        let number = generate_order_number();
        assert!(number.starts_with("ORD-"));
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn order_numbers_are_unique() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }

    #[test]
    fn item_subtotal() {
        let item = OrderItem {
            product_id: ProductId::generate(),
            quantity: 2,
            unit_price_cents: 99_99,
            points_earned: None,
        };
        assert_eq!(item.subtotal_cents(), 199_98);
    }

    #[test]
    fn status_transitions_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn cancellable_states() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn new_order_starts_pending() {
        let order = Order::new(MemberId::generate(), "a".into(), "b".into());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.discount_cents.is_none());
        assert!(order.items.is_empty());
    }
}
