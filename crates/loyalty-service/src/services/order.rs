//! Order lifecycle operations.
//!
//! Checkout, fulfillment, payment, and cancellation, with the stock and
//! points side effects kept consistent by the store's compound mutations.

use std::sync::Arc;

use chrono::Utc;

use loyalty_core::{
    points_earned_for_total, LoyaltyError, Order, OrderId, OrderItem, OrderStatus, PaymentStatus,
    Result, POINTS_DISCOUNT_RATE_CENTS,
};
use loyalty_store::{Store, StoreError};

/// One requested order line: a product and a quantity.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OrderLine {
    /// The product to order.
    pub product_id: loyalty_core::ProductId,
    /// Units requested.
    pub quantity: u32,
}

/// Input for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The member placing the order.
    pub member_id: loyalty_core::MemberId,
    /// Requested lines.
    pub items: Vec<OrderLine>,
    /// Points to convert into a discount, if any.
    pub points_to_use: Option<i64>,
    /// Shipping address override; falls back to the member's default.
    pub shipping_address: Option<String>,
    /// Billing address override; falls back to the member's default.
    pub billing_address: Option<String>,
}

/// Order lifecycle operations.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
}

impl OrderService {
    /// Create a new order service over a storage backend.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Place an order.
    ///
    /// Returns `None` when the member is unknown, any requested product is
    /// unknown, or any line exceeds the product's stock; all lines are
    /// validated before anything mutates, so a declined order leaves no side
    /// effect.
    ///
    /// On success, atomically: stock is decremented per line, unit prices are
    /// snapshotted from the live product prices, a points discount is applied
    /// at 1 cent per point capped at the subtotal (a `points_to_use` beyond
    /// the member's balance is skipped rather than rejected), the points are
    /// deducted from the member, and the order plus its line items are
    /// persisted. Points earned are computed once from the post-discount
    /// total.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::Validation`] when the order has no lines or a
    /// line has zero quantity.
    pub fn create_order(&self, new: NewOrder) -> Result<Option<Order>> {
        if new.items.is_empty() {
            return Err(LoyaltyError::Validation(
                "order must contain at least one item".into(),
            ));
        }
        if new.items.iter().any(|line| line.quantity == 0) {
            return Err(LoyaltyError::Validation(
                "item quantity must be positive".into(),
            ));
        }

        let Some(member) = self.store.get_member(&new.member_id)? else {
            return Ok(None);
        };

        // Validate every line up front against live products; prices are
        // snapshotted here and stay decoupled from later price edits.
        let mut items = Vec::with_capacity(new.items.len());
        for line in &new.items {
            let Some(product) = self.store.get_product(&line.product_id)? else {
                return Ok(None);
            };
            if product.stock_quantity < line.quantity {
                return Ok(None);
            }
            items.push(OrderItem {
                product_id: product.id,
                quantity: line.quantity,
                unit_price_cents: product.price_cents,
                points_earned: None,
            });
        }

        let subtotal: i64 = items.iter().map(OrderItem::subtotal_cents).sum();

        let mut discount_cents = None;
        let mut points_used = None;
        if let Some(points) = new.points_to_use {
            if points > 0 && points <= member.points_balance {
                let discount = (points * POINTS_DISCOUNT_RATE_CENTS).min(subtotal);
                discount_cents = Some(discount);
                points_used = Some(points);
            }
        }

        let total = subtotal - discount_cents.unwrap_or(0);

        let mut order = Order::new(
            new.member_id,
            pick_address(new.shipping_address, member.shipping_address.clone()),
            pick_address(new.billing_address, member.billing_address),
        );
        for item in &mut items {
            item.points_earned = Some(points_earned_for_total(item.subtotal_cents()));
        }
        order.items = items;
        order.subtotal_cents = subtotal;
        order.discount_cents = discount_cents;
        order.points_used = points_used;
        order.points_earned = Some(points_earned_for_total(total));
        order.total_cents = total;

        match self.store.place_order(&order) {
            Ok(()) => {
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    member_id = %order.member_id,
                    total_cents = order.total_cents,
                    "Order placed"
                );
                Ok(Some(order))
            }
            // A concurrent mutation can still invalidate the order between
            // the read above and the atomic placement; those declines stay
            // declines, not errors.
            Err(
                StoreError::NotFound { .. }
                | StoreError::InsufficientStock { .. }
                | StoreError::InsufficientPoints { .. },
            ) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Move an order to a new fulfillment status.
    ///
    /// Returns `false` when the order is unknown or the transition is not a
    /// legal forward move (`Cancelled` is never a valid target here; use
    /// [`OrderService::cancel_order`]). A transition into `Delivered` credits
    /// the member's `points_earned` exactly once; a repeated request for
    /// `Delivered` is rejected rather than credited again.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<bool> {
        let Some(order) = self.store.get_order(order_id)? else {
            return Ok(false);
        };
        if !order.status.can_transition_to(status) {
            return Ok(false);
        }

        if status == OrderStatus::Delivered {
            self.store.deliver_order(order_id)?;
        } else {
            self.store.set_order_status(order_id, status)?;
        }

        tracing::info!(order_id = %order_id, status = ?status, "Order status updated");
        Ok(true)
    }

    /// Record a completed payment against an order.
    ///
    /// Returns `false` when the order is unknown. Stores the external
    /// transaction id and stamps the paid-at time.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn process_payment(&self, order_id: &OrderId, transaction_id: &str) -> Result<bool> {
        let Some(mut order) = self.store.get_order(order_id)? else {
            return Ok(false);
        };

        let now = Utc::now();
        order.payment_status = PaymentStatus::Completed;
        order.payment_transaction_id = Some(transaction_id.to_string());
        order.paid_at = Some(now);
        order.updated_at = now;
        self.store.put_order(&order)?;

        tracing::info!(order_id = %order_id, transaction_id, "Payment completed");
        Ok(true)
    }

    /// Cancel an order, restoring stock for every line and refunding any
    /// points used, atomically.
    ///
    /// Returns `false` when the order is unknown, already Delivered, or
    /// already Cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn cancel_order(&self, order_id: &OrderId) -> Result<bool> {
        match self.store.cancel_order(order_id) {
            Ok(()) => {
                tracing::info!(order_id = %order_id, "Order cancelled");
                Ok(true)
            }
            Err(StoreError::NotFound { .. } | StoreError::Conflict(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Price a set of lines against live product prices, without placing
    /// anything. Unknown product ids are skipped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup fails.
    pub fn calculate_order_total(&self, items: &[OrderLine]) -> Result<i64> {
        let mut total = 0;
        for line in items {
            if let Some(product) = self.store.get_product(&line.product_id)? {
                total += product.price_cents * i64::from(line.quantity);
            }
        }
        Ok(total)
    }

    /// Points earned for an order total: one point per whole dollar, floored.
    #[must_use]
    pub const fn calculate_points_earned(total_cents: i64) -> i64 {
        points_earned_for_total(total_cents)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn get(&self, order_id: &OrderId) -> Result<Option<Order>> {
        Ok(self.store.get_order(order_id)?)
    }

    /// List all orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_orders()?)
    }

    /// List a member's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list_by_member(&self, member_id: &loyalty_core::MemberId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_by_member(member_id)?)
    }

    /// List orders in a fulfillment status.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_by_status(status)?)
    }
}

/// Address snapshot for an order: explicit override, then the member's
/// default, then empty.
fn pick_address(requested: Option<String>, member_default: Option<String>) -> String {
    requested.or(member_default).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_core::{Member, MemberId, Product, ProductId};
    use loyalty_store::MemoryStore;

    struct Fixture {
        orders: OrderService,
        store: Arc<MemoryStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            Self {
                orders: OrderService::new(store.clone()),
                store,
            }
        }

        fn member(&self, balance: i64) -> Member {
            let mut member = Member::new(
                "Member",
                format!("{}@example.com", MemberId::generate()),
            );
            member.points_balance = balance;
            self.store.put_member(&member).unwrap();
            member
        }

        fn product(&self, price_cents: i64, stock: u32) -> Product {
            let product = Product::new("Widget", "A widget", price_cents, "WID", stock, "misc");
            self.store.put_product(&product).unwrap();
            product
        }

        fn new_order(&self, member: &Member, lines: Vec<OrderLine>) -> NewOrder {
            NewOrder {
                member_id: member.id,
                items: lines,
                points_to_use: None,
                shipping_address: None,
                billing_address: None,
            }
        }
    }

    #[test]
    fn create_order_snapshots_prices_and_computes_points() {
        let fx = Fixture::new();
        let member = fx.member(0);
        let product = fx.product(99_99, 5);

        let order = fx
            .orders
            .create_order(fx.new_order(
                &member,
                vec![OrderLine {
                    product_id: product.id,
                    quantity: 2,
                }],
            ))
            .unwrap()
            .expect("order placed");

        assert_eq!(order.subtotal_cents, 199_98);
        assert_eq!(order.total_cents, 199_98);
        assert_eq!(order.points_earned, Some(199));
        assert!(order.discount_cents.is_none());
        assert_eq!(order.items[0].unit_price_cents, 99_99);

        assert_eq!(
            fx.store.get_product(&product.id).unwrap().unwrap().stock_quantity,
            3
        );
    }

    #[test]
    fn create_order_applies_points_discount() {
        let fx = Fixture::new();
        let member = fx.member(1500);
        let product = fx.product(99_99, 5);

        let mut new = fx.new_order(
            &member,
            vec![OrderLine {
                product_id: product.id,
                quantity: 1,
            }],
        );
        new.points_to_use = Some(1000);

        let order = fx.orders.create_order(new).unwrap().expect("order placed");

        assert_eq!(order.discount_cents, Some(10_00));
        assert_eq!(order.points_used, Some(1000));
        assert_eq!(order.total_cents, 89_99);
        assert_eq!(order.points_earned, Some(89));

        assert_eq!(
            fx.store.get_member(&member.id).unwrap().unwrap().points_balance,
            500
        );
    }

    #[test]
    fn discount_is_capped_at_subtotal() {
        let fx = Fixture::new();
        let member = fx.member(5000);
        let product = fx.product(10_00, 5);

        let mut new = fx.new_order(
            &member,
            vec![OrderLine {
                product_id: product.id,
                quantity: 1,
            }],
        );
        new.points_to_use = Some(5000);

        let order = fx.orders.create_order(new).unwrap().expect("order placed");

        // 5000 points are worth $50; the discount stops at the $10 subtotal
        // but the full point amount is deducted.
        assert_eq!(order.discount_cents, Some(10_00));
        assert_eq!(order.points_used, Some(5000));
        assert_eq!(order.total_cents, 0);
        assert_eq!(
            fx.store.get_member(&member.id).unwrap().unwrap().points_balance,
            0
        );
    }

    #[test]
    fn points_request_beyond_balance_is_skipped() {
        let fx = Fixture::new();
        let member = fx.member(100);
        let product = fx.product(50_00, 5);

        let mut new = fx.new_order(
            &member,
            vec![OrderLine {
                product_id: product.id,
                quantity: 1,
            }],
        );
        new.points_to_use = Some(1000);

        let order = fx.orders.create_order(new).unwrap().expect("order placed");

        assert!(order.discount_cents.is_none());
        assert!(order.points_used.is_none());
        assert_eq!(order.total_cents, 50_00);
        assert_eq!(
            fx.store.get_member(&member.id).unwrap().unwrap().points_balance,
            100
        );
    }

    #[test]
    fn create_order_declines_unknown_member_product_and_stock() {
        let fx = Fixture::new();
        let member = fx.member(0);
        let product = fx.product(10_00, 1);

        let ghost_member = fx.new_order(
            &Member::new("Ghost", "ghost@example.com"),
            vec![OrderLine {
                product_id: product.id,
                quantity: 1,
            }],
        );
        assert!(fx.orders.create_order(ghost_member).unwrap().is_none());

        let ghost_product = fx.new_order(
            &member,
            vec![OrderLine {
                product_id: ProductId::generate(),
                quantity: 1,
            }],
        );
        assert!(fx.orders.create_order(ghost_product).unwrap().is_none());

        let over_stock = fx.new_order(
            &member,
            vec![OrderLine {
                product_id: product.id,
                quantity: 2,
            }],
        );
        assert!(fx.orders.create_order(over_stock).unwrap().is_none());

        // Declines leave stock untouched.
        assert_eq!(
            fx.store.get_product(&product.id).unwrap().unwrap().stock_quantity,
            1
        );
    }

    #[test]
    fn create_order_validates_lines() {
        let fx = Fixture::new();
        let member = fx.member(0);
        let product = fx.product(10_00, 5);

        assert!(matches!(
            fx.orders.create_order(fx.new_order(&member, vec![])),
            Err(LoyaltyError::Validation(_))
        ));
        assert!(matches!(
            fx.orders.create_order(fx.new_order(
                &member,
                vec![OrderLine {
                    product_id: product.id,
                    quantity: 0,
                }],
            )),
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[test]
    fn status_moves_forward_and_delivery_credits_once() {
        let fx = Fixture::new();
        let member = fx.member(0);
        let product = fx.product(150_00, 5);

        let order = fx
            .orders
            .create_order(fx.new_order(
                &member,
                vec![OrderLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .unwrap()
            .unwrap();

        assert!(fx.orders.update_status(&order.id, OrderStatus::Processing).unwrap());
        assert!(!fx.orders.update_status(&order.id, OrderStatus::Pending).unwrap());
        assert!(fx.orders.update_status(&order.id, OrderStatus::Delivered).unwrap());

        assert_eq!(
            fx.store.get_member(&member.id).unwrap().unwrap().points_balance,
            150
        );

        // Re-delivering is rejected and does not double-credit.
        assert!(!fx.orders.update_status(&order.id, OrderStatus::Delivered).unwrap());
        assert_eq!(
            fx.store.get_member(&member.id).unwrap().unwrap().points_balance,
            150
        );
    }

    #[test]
    fn cancelled_is_not_reachable_through_update_status() {
        let fx = Fixture::new();
        let member = fx.member(0);
        let product = fx.product(10_00, 5);

        let order = fx
            .orders
            .create_order(fx.new_order(
                &member,
                vec![OrderLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .unwrap()
            .unwrap();

        assert!(!fx.orders.update_status(&order.id, OrderStatus::Cancelled).unwrap());
        assert_eq!(
            fx.store.get_order(&order.id).unwrap().unwrap().status,
            OrderStatus::Pending
        );
    }

    #[test]
    fn cancel_restores_stock_and_points() {
        let fx = Fixture::new();
        let member = fx.member(300);
        let product = fx.product(40_00, 4);

        let mut new = fx.new_order(
            &member,
            vec![OrderLine {
                product_id: product.id,
                quantity: 2,
            }],
        );
        new.points_to_use = Some(300);
        let order = fx.orders.create_order(new).unwrap().unwrap();

        assert!(fx.orders.cancel_order(&order.id).unwrap());
        assert_eq!(
            fx.store.get_product(&product.id).unwrap().unwrap().stock_quantity,
            4
        );
        assert_eq!(
            fx.store.get_member(&member.id).unwrap().unwrap().points_balance,
            300
        );

        // A second cancel and a cancel of a delivered order are both rejected.
        assert!(!fx.orders.cancel_order(&order.id).unwrap());

        let delivered = fx
            .orders
            .create_order(fx.new_order(
                &member,
                vec![OrderLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .unwrap()
            .unwrap();
        fx.orders.update_status(&delivered.id, OrderStatus::Delivered).unwrap();
        assert!(!fx.orders.cancel_order(&delivered.id).unwrap());
    }

    #[test]
    fn process_payment_stamps_transaction() {
        let fx = Fixture::new();
        let member = fx.member(0);
        let product = fx.product(25_00, 5);

        let order = fx
            .orders
            .create_order(fx.new_order(
                &member,
                vec![OrderLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            ))
            .unwrap()
            .unwrap();

        assert!(fx.orders.process_payment(&order.id, "txn_123").unwrap());
        let stored = fx.store.get_order(&order.id).unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Completed);
        assert_eq!(stored.payment_transaction_id.as_deref(), Some("txn_123"));
        assert!(stored.paid_at.is_some());

        assert!(!fx.orders.process_payment(&OrderId::generate(), "txn_404").unwrap());
    }

    #[test]
    fn quote_skips_unknown_products() {
        let fx = Fixture::new();
        let product = fx.product(15_00, 5);

        let total = fx
            .orders
            .calculate_order_total(&[
                OrderLine {
                    product_id: product.id,
                    quantity: 2,
                },
                OrderLine {
                    product_id: ProductId::generate(),
                    quantity: 9,
                },
            ])
            .unwrap();

        assert_eq!(total, 30_00);
        assert_eq!(OrderService::calculate_points_earned(30_00), 30);
    }
}
