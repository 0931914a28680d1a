//! Core types for the loyalty platform.
//!
//! This crate provides the foundational types used throughout the platform:
//!
//! - **Identifiers**: `MemberId`, `OrderId`, `ProductId`, `RewardId`,
//!   `UserId`, `LedgerEntryId`, `RedemptionId`
//! - **Members**: `Member`, `Tier`
//! - **Orders**: `Order`, `OrderItem`, `OrderStatus`, `PaymentStatus`
//! - **Products**: `Product`
//! - **Rewards**: `Reward`, `RewardType`, `RewardRedemption`
//! - **Points ledger**: `LedgerEntry`, `LedgerEntryType`
//!
//! # Money and points
//!
//! All monetary amounts are stored as `i64` integer cents to avoid floating
//! point precision issues. Points convert at fixed rates:
//!
//! - **1 point = $0.01 (1 cent) of discount** when spent against an order
//! - **1 point earned per $1** of final order total (floor)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod ledger;
pub mod member;
pub mod order;
pub mod product;
pub mod reward;
pub mod user;

pub use error::{LoyaltyError, Result};
pub use ids::{
    IdError, LedgerEntryId, MemberId, OrderId, ProductId, RedemptionId, RewardId, UserId,
};
pub use ledger::{LedgerEntry, LedgerEntryType};
pub use member::{
    Member, Tier, GOLD_THRESHOLD_CENTS, PLATINUM_THRESHOLD_CENTS, SILVER_THRESHOLD_CENTS,
};
pub use order::{
    points_earned_for_total, Order, OrderItem, OrderStatus, PaymentStatus,
    POINTS_DISCOUNT_RATE_CENTS, POINTS_EARNED_PER_DOLLAR,
};
pub use product::Product;
pub use reward::{Reward, RewardRedemption, RewardType};
pub use user::User;
