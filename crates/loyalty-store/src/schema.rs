//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary member records, keyed by `member_id`.
    pub const MEMBERS: &str = "members";

    /// Index: member id by email. Value is the member UUID bytes.
    pub const MEMBERS_BY_EMAIL: &str = "members_by_email";

    /// Auth user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Index: user id by email. Value is the user UUID bytes.
    pub const USERS_BY_EMAIL: &str = "users_by_email";

    /// Product records, keyed by `product_id`.
    pub const PRODUCTS: &str = "products";

    /// Order records (with embedded line items), keyed by `order_id`.
    pub const ORDERS: &str = "orders";

    /// Index: orders by member, keyed by `member_id || order_id`.
    /// Value is empty (index only).
    pub const ORDERS_BY_MEMBER: &str = "orders_by_member";

    /// Ledger entries, keyed by `entry_id` (ULID).
    pub const LEDGER: &str = "ledger";

    /// Index: ledger entries by member, keyed by `member_id || entry_id`.
    /// Value is empty (index only). ULID suffix keeps the range time-ordered.
    pub const LEDGER_BY_MEMBER: &str = "ledger_by_member";

    /// Reward records, keyed by `reward_id`.
    pub const REWARDS: &str = "rewards";

    /// Redemption records, keyed by `member_id || redemption_id`.
    /// The full record is the value; redemptions are only read per member.
    pub const REDEMPTIONS_BY_MEMBER: &str = "redemptions_by_member";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::MEMBERS,
        cf::MEMBERS_BY_EMAIL,
        cf::USERS,
        cf::USERS_BY_EMAIL,
        cf::PRODUCTS,
        cf::ORDERS,
        cf::ORDERS_BY_MEMBER,
        cf::LEDGER,
        cf::LEDGER_BY_MEMBER,
        cf::REWARDS,
        cf::REDEMPTIONS_BY_MEMBER,
    ]
}
