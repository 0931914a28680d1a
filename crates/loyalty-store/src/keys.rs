//! Key encoding utilities for `RocksDB`.
//!
//! Composite index keys are fixed-width `parent_id (16 bytes) || child_id
//! (16 bytes)`, so a prefix scan over the parent id yields the children; for
//! ULID children the scan comes back time-ordered.

use loyalty_core::{LedgerEntryId, MemberId, OrderId, ProductId, RedemptionId, RewardId, UserId};

/// Create a member key from a member id.
#[must_use]
pub fn member_key(member_id: &MemberId) -> Vec<u8> {
    member_id.as_bytes().to_vec()
}

/// Create a user key from a user id.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create an email index key.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    email.as_bytes().to_vec()
}

/// Create a product key from a product id.
#[must_use]
pub fn product_key(product_id: &ProductId) -> Vec<u8> {
    product_id.as_bytes().to_vec()
}

/// Create an order key from an order id.
#[must_use]
pub fn order_key(order_id: &OrderId) -> Vec<u8> {
    order_id.as_bytes().to_vec()
}

/// Create a reward key from a reward id.
#[must_use]
pub fn reward_key(reward_id: &RewardId) -> Vec<u8> {
    reward_id.as_bytes().to_vec()
}

/// Create a ledger entry key from an entry id.
#[must_use]
pub fn ledger_key(entry_id: &LedgerEntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a member-order index key.
///
/// Format: `member_id (16 bytes) || order_id (16 bytes)`.
#[must_use]
pub fn member_order_key(member_id: &MemberId, order_id: &OrderId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(member_id.as_bytes());
    key.extend_from_slice(order_id.as_bytes());
    key
}

/// Create a member-ledger index key.
///
/// Format: `member_id (16 bytes) || entry_id (16 bytes)`.
///
/// Since ULIDs are time-ordered, a member's entries sort chronologically.
#[must_use]
pub fn member_ledger_key(member_id: &MemberId, entry_id: &LedgerEntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(member_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a member-redemption key.
///
/// Format: `member_id (16 bytes) || redemption_id (16 bytes)`.
#[must_use]
pub fn member_redemption_key(member_id: &MemberId, redemption_id: &RedemptionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(member_id.as_bytes());
    key.extend_from_slice(&redemption_id.to_bytes());
    key
}

/// Create a prefix for iterating a member's index entries.
#[must_use]
pub fn member_prefix(member_id: &MemberId) -> Vec<u8> {
    member_id.as_bytes().to_vec()
}

/// Extract the order id from a member-order index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_order_id(key: &[u8]) -> OrderId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    OrderId::from_uuid(uuid::Uuid::from_bytes(bytes))
}

/// Extract the ledger entry id from a member-ledger index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_ledger_id(key: &[u8]) -> LedgerEntryId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    LedgerEntryId::from_bytes(bytes).expect("valid ULID bytes")
}
