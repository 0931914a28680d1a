//! Reward catalog and redemption types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MemberId, RedemptionId, RewardId};

/// A reward that members can redeem points for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    /// The reward id.
    pub id: RewardId,

    /// Display name.
    pub name: String,

    /// Description.
    pub description: String,

    /// Points required to redeem. Always positive.
    pub points_cost: i64,

    /// Whether the reward can currently be redeemed.
    pub is_active: bool,

    /// Remaining stock. `None` means unlimited.
    pub stock_quantity: Option<u32>,

    /// Start of the redemption window, if bounded.
    pub starts_at: Option<DateTime<Utc>>,

    /// End of the redemption window, if bounded.
    pub ends_at: Option<DateTime<Utc>>,

    /// Kind of benefit this reward grants.
    pub kind: RewardType,

    /// Fixed discount value, in cents, for discount rewards.
    pub discount_cents: Option<i64>,

    /// Percentage discount, for discount rewards.
    pub discount_percent: Option<u8>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// Create a new active reward.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        points_cost: i64,
        kind: RewardType,
        stock_quantity: Option<u32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RewardId::generate(),
            name: name.into(),
            description: description.into(),
            points_cost,
            is_active: true,
            stock_quantity,
            starts_at: None,
            ends_at: None,
            kind,
            discount_cents: None,
            discount_percent: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the reward has stock left. Unlimited rewards always do.
    #[must_use]
    pub fn has_stock(&self) -> bool {
        self.stock_quantity.map_or(true, |qty| qty > 0)
    }
}

/// Kind of benefit a reward grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    /// A discount against a future order.
    Discount,

    /// A free product.
    FreeProduct,

    /// A service benefit.
    Service,

    /// An experience benefit.
    Experience,
}

/// An immutable record of a member exchanging points for a reward.
///
/// The points cost is snapshotted at redemption time and stays unchanged even
/// if the reward's cost is later edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRedemption {
    /// Unique redemption id (ULID for time-ordering).
    pub id: RedemptionId,

    /// The member who redeemed.
    pub member_id: MemberId,

    /// The reward redeemed.
    pub reward_id: RewardId,

    /// Points charged at redemption time.
    pub points_cost: i64,

    /// When the redemption happened.
    pub redeemed_at: DateTime<Utc>,
}

impl RewardRedemption {
    /// Create a redemption record for a member and reward.
    #[must_use]
    pub fn new(member_id: MemberId, reward_id: RewardId, points_cost: i64) -> Self {
        Self {
            id: RedemptionId::generate(),
            member_id,
            reward_id,
            points_cost,
            redeemed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reward_is_active() {
        let reward = Reward::new("Free coffee", "One free coffee", 500, RewardType::FreeProduct, Some(10));
        assert!(reward.is_active);
        assert_eq!(reward.points_cost, 500);
    }

    #[test]
    fn stock_check_treats_none_as_unlimited() {
        let mut reward = Reward::new("Perk", "A perk", 100, RewardType::Service, None);
        assert!(reward.has_stock());

        reward.stock_quantity = Some(1);
        assert!(reward.has_stock());

        reward.stock_quantity = Some(0);
        assert!(!reward.has_stock());
    }

    #[test]
    fn redemption_snapshots_cost() {
        let member_id = MemberId::generate();
        let reward_id = RewardId::generate();
        let redemption = RewardRedemption::new(member_id, reward_id, 750);
        assert_eq!(redemption.points_cost, 750);
        assert_eq!(redemption.member_id, member_id);
    }
}
