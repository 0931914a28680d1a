//! Reward catalog and redemption operations.

use std::sync::Arc;

use chrono::Utc;

use loyalty_core::{
    LoyaltyError, MemberId, Result, Reward, RewardId, RewardRedemption, RewardType,
};
use loyalty_store::{Store, StoreError};

use super::require_non_blank;

/// Reward catalog and redemption operations.
#[derive(Clone)]
pub struct RewardService {
    store: Arc<dyn Store>,
}

impl RewardService {
    /// Create a new reward service over a storage backend.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add a reward to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::Validation`] when the name is blank or the
    /// points cost is not positive.
    pub fn add(
        &self,
        name: &str,
        description: &str,
        points_cost: i64,
        kind: RewardType,
        stock_quantity: Option<u32>,
    ) -> Result<Reward> {
        require_non_blank(name, "name")?;
        if points_cost <= 0 {
            return Err(LoyaltyError::Validation(
                "points cost must be positive".into(),
            ));
        }

        let reward = Reward::new(name.trim(), description, points_cost, kind, stock_quantity);
        self.store.put_reward(&reward)?;
        tracing::info!(reward_id = %reward.id, points_cost, "Reward created");
        Ok(reward)
    }

    /// Update a reward. Returns `None` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::Validation`] when the name is blank or the
    /// points cost is not positive.
    pub fn update(&self, reward: Reward) -> Result<Option<Reward>> {
        let Some(stored) = self.store.get_reward(&reward.id)? else {
            return Ok(None);
        };

        require_non_blank(&reward.name, "name")?;
        if reward.points_cost <= 0 {
            return Err(LoyaltyError::Validation(
                "points cost must be positive".into(),
            ));
        }

        let mut updated = reward;
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        self.store.put_reward(&updated)?;
        Ok(Some(updated))
    }

    /// Delete a reward. Returns `false` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn delete(&self, reward_id: &RewardId) -> Result<bool> {
        match self.store.delete_reward(reward_id) {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Exchange a member's points for a reward.
    ///
    /// Returns `false` when the member is unknown, the reward is unknown,
    /// inactive, or out of stock, or the member's balance is below the
    /// reward's points cost. On success, atomically: the balance is debited
    /// by the cost, the reward stock drops by one (deactivating the reward
    /// at zero), and a redemption record snapshots the cost actually
    /// charged. A declined redemption leaves no partial side effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn redeem(&self, member_id: &MemberId, reward_id: &RewardId) -> Result<bool> {
        if self.store.get_member(member_id)?.is_none() {
            return Ok(false);
        }
        let Some(reward) = self.store.get_reward(reward_id)? else {
            return Ok(false);
        };

        let redemption = RewardRedemption::new(*member_id, *reward_id, reward.points_cost);
        match self.store.redeem_reward(member_id, reward_id, &redemption) {
            Ok(()) => {
                tracing::info!(
                    member_id = %member_id,
                    reward_id = %reward_id,
                    points_cost = reward.points_cost,
                    "Reward redeemed"
                );
                Ok(true)
            }
            Err(
                StoreError::NotFound { .. }
                | StoreError::Conflict(_)
                | StoreError::InsufficientPoints { .. },
            ) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a reward's stock level; the reward is active exactly when the
    /// quantity is positive.
    ///
    /// Returns `false` when the id is unknown or the quantity is negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn set_stock(&self, reward_id: &RewardId, quantity: i64) -> Result<bool> {
        let Ok(quantity) = u32::try_from(quantity) else {
            return Ok(false);
        };
        let Some(mut reward) = self.store.get_reward(reward_id)? else {
            return Ok(false);
        };

        reward.stock_quantity = Some(quantity);
        reward.is_active = quantity > 0;
        reward.updated_at = Utc::now();
        self.store.put_reward(&reward)?;

        tracing::debug!(reward_id = %reward_id, quantity, "Reward stock set");
        Ok(true)
    }

    /// Get a reward by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn get(&self, reward_id: &RewardId) -> Result<Option<Reward>> {
        Ok(self.store.get_reward(reward_id)?)
    }

    /// List all rewards.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list(&self) -> Result<Vec<Reward>> {
        Ok(self.store.list_rewards()?)
    }

    /// List rewards currently redeemable.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list_active(&self) -> Result<Vec<Reward>> {
        Ok(self.store.list_active_rewards()?)
    }

    /// List rewards whose cost falls within `[min_points, max_points]`.
    /// A negative minimum or an inverted range yields no results.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list_by_points_range(&self, min_points: i64, max_points: i64) -> Result<Vec<Reward>> {
        if min_points < 0 || max_points < min_points {
            return Ok(Vec::new());
        }
        Ok(self.store.list_rewards_by_points_range(min_points, max_points)?)
    }

    /// List a member's redemptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn member_redemptions(&self, member_id: &MemberId) -> Result<Vec<RewardRedemption>> {
        Ok(self.store.list_redemptions_by_member(member_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_core::Member;
    use loyalty_store::MemoryStore;

    fn service() -> (RewardService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (RewardService::new(store.clone()), store)
    }

    fn member_with_balance(store: &MemoryStore, balance: i64) -> Member {
        let mut member = Member::new("Member", format!("{}@example.com", MemberId::generate()));
        member.points_balance = balance;
        store.put_member(&member).unwrap();
        member
    }

    #[test]
    fn add_validates_input() {
        let (rewards, _) = service();

        assert!(matches!(
            rewards.add(" ", "desc", 100, RewardType::Discount, None),
            Err(LoyaltyError::Validation(_))
        ));
        assert!(matches!(
            rewards.add("Voucher", "desc", 0, RewardType::Discount, None),
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[test]
    fn redeem_debits_balance_and_stock_exactly_once() {
        let (rewards, store) = service();
        let member = member_with_balance(&store, 1000);
        let reward = rewards
            .add("Tote", "A tote bag", 1000, RewardType::FreeProduct, Some(1))
            .unwrap();

        assert!(rewards.redeem(&member.id, &reward.id).unwrap());

        assert_eq!(store.get_member(&member.id).unwrap().unwrap().points_balance, 0);
        let stored = rewards.get(&reward.id).unwrap().unwrap();
        assert_eq!(stored.stock_quantity, Some(0));
        assert!(!stored.is_active);

        let redemptions = rewards.member_redemptions(&member.id).unwrap();
        assert_eq!(redemptions.len(), 1);
        assert_eq!(redemptions[0].points_cost, 1000);

        // Out of stock now, so a second redemption is declined.
        assert!(!rewards.redeem(&member.id, &reward.id).unwrap());
    }

    #[test]
    fn redeem_declines_without_side_effects() {
        let (rewards, store) = service();
        let member = member_with_balance(&store, 100);
        let reward = rewards
            .add("Spa", "A spa day", 500, RewardType::Experience, Some(3))
            .unwrap();

        // Insufficient balance.
        assert!(!rewards.redeem(&member.id, &reward.id).unwrap());
        // Unknown member and unknown reward.
        assert!(!rewards.redeem(&MemberId::generate(), &reward.id).unwrap());
        assert!(!rewards.redeem(&member.id, &RewardId::generate()).unwrap());

        assert_eq!(store.get_member(&member.id).unwrap().unwrap().points_balance, 100);
        assert_eq!(rewards.get(&reward.id).unwrap().unwrap().stock_quantity, Some(3));
        assert!(rewards.member_redemptions(&member.id).unwrap().is_empty());
    }

    #[test]
    fn redeem_declines_inactive_reward() {
        let (rewards, store) = service();
        let member = member_with_balance(&store, 1000);
        let reward = rewards
            .add("Old perk", "Retired", 100, RewardType::Service, Some(5))
            .unwrap();
        assert!(rewards.set_stock(&reward.id, 0).unwrap());

        assert!(!rewards.redeem(&member.id, &reward.id).unwrap());
    }

    #[test]
    fn redemption_snapshots_cost_against_later_edits() {
        let (rewards, store) = service();
        let member = member_with_balance(&store, 500);
        let reward = rewards
            .add("Voucher", "A voucher", 500, RewardType::Discount, Some(10))
            .unwrap();

        assert!(rewards.redeem(&member.id, &reward.id).unwrap());

        let mut edited = rewards.get(&reward.id).unwrap().unwrap();
        edited.points_cost = 900;
        rewards.update(edited).unwrap();

        let redemptions = rewards.member_redemptions(&member.id).unwrap();
        assert_eq!(redemptions[0].points_cost, 500);
    }

    #[test]
    fn set_stock_reactivates_and_rejects_negative() {
        let (rewards, _) = service();
        let reward = rewards
            .add("Voucher", "A voucher", 100, RewardType::Discount, Some(0))
            .unwrap();

        assert!(!rewards.set_stock(&reward.id, -1).unwrap());
        assert!(rewards.set_stock(&reward.id, 4).unwrap());

        let stored = rewards.get(&reward.id).unwrap().unwrap();
        assert_eq!(stored.stock_quantity, Some(4));
        assert!(stored.is_active);

        assert!(!rewards.set_stock(&RewardId::generate(), 1).unwrap());
    }

    #[test]
    fn points_range_listing() {
        let (rewards, _) = service();
        rewards.add("Small", "s", 100, RewardType::Discount, None).unwrap();
        rewards.add("Large", "l", 5000, RewardType::Experience, None).unwrap();

        let mid = rewards.list_by_points_range(50, 1000).unwrap();
        assert_eq!(mid.len(), 1);
        assert_eq!(mid[0].name, "Small");

        assert!(rewards.list_by_points_range(-1, 100).unwrap().is_empty());
        assert!(rewards.list_by_points_range(100, 50).unwrap().is_empty());
    }

    #[test]
    fn update_unknown_returns_none() {
        let (rewards, _) = service();
        let ghost = Reward::new("Ghost", "Not stored", 100, RewardType::Service, None);
        assert!(rewards.update(ghost).unwrap().is_none());
        assert!(!rewards.delete(&RewardId::generate()).unwrap());
    }
}
