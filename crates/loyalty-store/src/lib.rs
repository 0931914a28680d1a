//! Storage layer for the loyalty platform.
//!
//! This crate provides the persistence gateway behind the domain services.
//! The [`Store`] trait exposes per-entity CRUD and finder queries plus the
//! compound mutations that must be atomic (order placement, delivery credit,
//! cancellation, points adjustment, reward redemption).
//!
//! Two backends implement the trait:
//!
//! - [`MemoryStore`] — arena-style maps behind a single `RwLock`; always
//!   available, used by tests and development runs.
//! - `RocksStore` — persistent storage using `RocksDB` column families with
//!   secondary indexes, behind the `rocksdb-backend` feature.
//!
//! # Atomicity
//!
//! Each compound mutation executes inside a single transaction scope: the
//! write lock for the memory backend, a `WriteBatch` for `RocksDB`. No step
//! within a compound mutation is individually durable; on any validation
//! failure the error propagates and no partial state is observable.
//!
//! # Example
//!
//! ```
//! use loyalty_store::{MemoryStore, Store};
//! use loyalty_core::Member;
//!
//! let store = MemoryStore::new();
//! let member = Member::new("Alice", "alice@example.com");
//! store.put_member(&member).unwrap();
//!
//! let found = store.get_member_by_email("alice@example.com").unwrap();
//! assert!(found.is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use loyalty_core::{
    LedgerEntry, LedgerEntryId, Member, MemberId, Order, OrderId, OrderStatus, Product, ProductId,
    Reward, RewardId, RewardRedemption, Tier, User, UserId,
};

/// The storage trait defining all database operations.
///
/// Object-safe so the service layer can hold an `Arc<dyn Store>` and swap
/// backends without code changes.
pub trait Store: Send + Sync {
    // =========================================================================
    // Member Operations
    // =========================================================================

    /// Insert or update a member record, maintaining the unique email index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmailTaken`] if the email belongs to a different
    /// member.
    fn put_member(&self, member: &Member) -> Result<()>;

    /// Get a member by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_member(&self, member_id: &MemberId) -> Result<Option<Member>>;

    /// Get a member by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_member_by_email(&self, email: &str) -> Result<Option<Member>>;

    /// Delete a member by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the member doesn't exist.
    fn delete_member(&self, member_id: &MemberId) -> Result<()>;

    /// List all members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_members(&self) -> Result<Vec<Member>>;

    /// List members currently holding the given tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_members_by_tier(&self, tier: Tier) -> Result<Vec<Member>>;

    /// Check whether a member has any orders or ledger entries.
    ///
    /// Used by the restrict-on-delete policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn member_has_activity(&self, member_id: &MemberId) -> Result<bool>;

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert or update an auth user, maintaining the unique email index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmailTaken`] if the email belongs to a different
    /// user.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // =========================================================================
    // Product Operations
    // =========================================================================

    /// Insert or update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_product(&self, product: &Product) -> Result<()>;

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Delete a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the product doesn't exist.
    fn delete_product(&self, product_id: &ProductId) -> Result<()>;

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_products(&self) -> Result<Vec<Product>>;

    /// List products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_products_by_category(&self, category: &str) -> Result<Vec<Product>>;

    /// List products whose name or description contains the term
    /// (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn search_products(&self, term: &str) -> Result<Vec<Product>>;

    /// List products with stock at or below the threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_low_stock(&self, threshold: u32) -> Result<Vec<Product>>;

    // =========================================================================
    // Order Operations
    // =========================================================================

    /// Insert or update an order (including its line items).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_order(&self, order: &Order) -> Result<()>;

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>>;

    /// List all orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_orders(&self) -> Result<Vec<Order>>;

    /// List a member's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_orders_by_member(&self, member_id: &MemberId) -> Result<Vec<Order>>;

    /// List orders in a given fulfillment status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;

    /// Set an order's fulfillment status without side effects.
    ///
    /// Delivery and cancellation have side effects and go through
    /// [`Store::deliver_order`] and [`Store::cancel_order`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the order doesn't exist.
    fn set_order_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<()>;

    /// Sum of `total_cents` over the member's Delivered orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delivered_total_cents(&self, member_id: &MemberId) -> Result<i64>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a ledger entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_ledger_entry(&self, entry_id: &LedgerEntryId) -> Result<Option<LedgerEntry>>;

    /// List a member's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_ledger_by_member(
        &self,
        member_id: &MemberId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;

    // =========================================================================
    // Reward Operations
    // =========================================================================

    /// Insert or update a reward.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_reward(&self, reward: &Reward) -> Result<()>;

    /// Get a reward by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_reward(&self, reward_id: &RewardId) -> Result<Option<Reward>>;

    /// Delete a reward by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the reward doesn't exist.
    fn delete_reward(&self, reward_id: &RewardId) -> Result<()>;

    /// List all rewards.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_rewards(&self) -> Result<Vec<Reward>>;

    /// List rewards currently redeemable.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_active_rewards(&self) -> Result<Vec<Reward>>;

    /// List rewards whose points cost falls within `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_rewards_by_points_range(&self, min_points: i64, max_points: i64)
        -> Result<Vec<Reward>>;

    /// List a member's redemptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_redemptions_by_member(&self, member_id: &MemberId) -> Result<Vec<RewardRedemption>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Adjust a member's balance and append the ledger entry atomically.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the member doesn't exist.
    /// - [`StoreError::InsufficientPoints`] if the balance would go negative;
    ///   neither write happens.
    fn adjust_points(&self, member_id: &MemberId, delta: i64, entry: &LedgerEntry) -> Result<i64>;

    /// Place an order atomically: validate stock for every line and the
    /// member's balance for `points_used`, then decrement stock, deduct
    /// points (with a spend ledger entry), and persist the order.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the member or any product doesn't exist.
    /// - [`StoreError::InsufficientStock`] if any line exceeds stock.
    /// - [`StoreError::InsufficientPoints`] if `points_used` exceeds the
    ///   balance.
    ///
    /// On any error no stock decrement, points deduction, or order write is
    /// observable.
    fn place_order(&self, order: &Order) -> Result<()>;

    /// Mark an order Delivered and credit its `points_earned` to the member
    /// (with an earn ledger entry), atomically and exactly once.
    ///
    /// An order already in Delivered is left unchanged (no second credit).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the order or member doesn't exist.
    fn deliver_order(&self, order_id: &OrderId) -> Result<()>;

    /// Cancel an order atomically: restore stock for every line, refund any
    /// `points_used` (with an earn ledger entry), and set status Cancelled.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the order doesn't exist.
    /// - [`StoreError::Conflict`] if the order is Delivered or already
    ///   Cancelled.
    fn cancel_order(&self, order_id: &OrderId) -> Result<()>;

    /// Redeem a reward atomically: debit the member by the reward's points
    /// cost (with a spend ledger entry), decrement reward stock (deactivating
    /// at zero), and insert the redemption record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the member or reward doesn't exist.
    /// - [`StoreError::Conflict`] if the reward is inactive or out of stock.
    /// - [`StoreError::InsufficientPoints`] if the balance is below the cost.
    ///
    /// On any error no balance change, stock change, or redemption row is
    /// observable.
    fn redeem_reward(
        &self,
        member_id: &MemberId,
        reward_id: &RewardId,
        redemption: &RewardRedemption,
    ) -> Result<()>;
}
