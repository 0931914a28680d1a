//! Member and points operations.
//!
//! Owns the member profile, the points balance with its append-only ledger,
//! and the loyalty tier. The tier is derived from cumulative delivered-order
//! spend; a stored tier may never exceed that entitlement.

use std::sync::Arc;

use chrono::Utc;

use loyalty_core::{LedgerEntry, LoyaltyError, Member, MemberId, OrderStatus, Result, Tier};
use loyalty_store::{Store, StoreError};

use super::{not_found, require_non_blank};

/// Member and points operations.
#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn Store>,
}

impl MemberService {
    /// Create a new member service over a storage backend.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a new member with zero balance and Standard tier.
    ///
    /// # Errors
    ///
    /// - [`LoyaltyError::Validation`] when name or email is blank.
    /// - [`LoyaltyError::Conflict`] when the email is already registered.
    pub fn create(
        &self,
        name: &str,
        email: &str,
        shipping_address: Option<String>,
        billing_address: Option<String>,
    ) -> Result<Member> {
        require_non_blank(name, "name")?;
        require_non_blank(email, "email")?;

        let mut member = Member::new(name.trim(), email.trim());
        member.shipping_address = shipping_address;
        member.billing_address = billing_address;

        self.store.put_member(&member)?;
        tracing::info!(member_id = %member.id, "Member created");

        Ok(member)
    }

    /// Update a member's profile fields.
    ///
    /// The balance, tier, and join date are preserved from the stored record
    /// regardless of what the caller supplied; those fields only change
    /// through the points and tier operations.
    ///
    /// # Errors
    ///
    /// - [`LoyaltyError::NotFound`] when the id is unknown.
    /// - [`LoyaltyError::Validation`] when name or email is blank.
    /// - [`LoyaltyError::Conflict`] when the new email belongs to a different
    ///   member.
    pub fn update(&self, member: Member) -> Result<Member> {
        let stored = self
            .store
            .get_member(&member.id)?
            .ok_or_else(|| not_found("member", member.id))?;

        require_non_blank(&member.name, "name")?;
        require_non_blank(&member.email, "email")?;

        let mut updated = member;
        updated.points_balance = stored.points_balance;
        updated.tier = stored.tier;
        updated.joined_at = stored.joined_at;
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();

        self.store.put_member(&updated)?;
        Ok(updated)
    }

    /// Delete a member.
    ///
    /// Deletion is restricted: a member with any orders or ledger entries
    /// cannot be deleted, so the order history and points ledger always keep
    /// a valid owner.
    ///
    /// # Errors
    ///
    /// - [`LoyaltyError::NotFound`] when the id is unknown.
    /// - [`LoyaltyError::Conflict`] when the member has dependent records.
    pub fn delete(&self, member_id: &MemberId) -> Result<()> {
        if self.store.get_member(member_id)?.is_none() {
            return Err(not_found("member", member_id));
        }
        if self.store.member_has_activity(member_id)? {
            return Err(LoyaltyError::Conflict(format!(
                "member {member_id} has orders or ledger entries and cannot be deleted"
            )));
        }

        self.store.delete_member(member_id)?;
        tracing::info!(member_id = %member_id, "Member deleted");
        Ok(())
    }

    /// Get a member by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn get(&self, member_id: &MemberId) -> Result<Option<Member>> {
        Ok(self.store.get_member(member_id)?)
    }

    /// Get a member by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn get_by_email(&self, email: &str) -> Result<Option<Member>> {
        Ok(self.store.get_member_by_email(email)?)
    }

    /// List all members.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list(&self) -> Result<Vec<Member>> {
        Ok(self.store.list_members()?)
    }

    /// List members currently holding a tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list_by_tier(&self, tier: Tier) -> Result<Vec<Member>> {
        Ok(self.store.list_members_by_tier(tier)?)
    }

    /// Adjust a member's balance by a signed delta and append one ledger
    /// entry, atomically.
    ///
    /// Returns `Some(new_balance)` on success, or `None` when the adjustment
    /// is declined because the balance would go negative (no side effect in
    /// that case).
    ///
    /// # Errors
    ///
    /// - [`LoyaltyError::NotFound`] when the member is unknown.
    /// - [`LoyaltyError::Validation`] when the description is blank.
    pub fn adjust_points(
        &self,
        member_id: &MemberId,
        delta: i64,
        description: &str,
    ) -> Result<Option<i64>> {
        if self.store.get_member(member_id)?.is_none() {
            return Err(not_found("member", member_id));
        }
        require_non_blank(description, "description")?;

        let entry = if delta >= 0 {
            LedgerEntry::earn(*member_id, delta, description.to_string())
        } else {
            LedgerEntry::spend(*member_id, delta, description.to_string())
        };

        match self.store.adjust_points(member_id, delta, &entry) {
            Ok(balance) => {
                tracing::info!(member_id = %member_id, delta, balance, "Points adjusted");
                Ok(Some(balance))
            }
            Err(StoreError::InsufficientPoints { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Compute the tier a member's cumulative delivered-order spend entitles
    /// them to. Pure with respect to stored data; does not mutate.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::NotFound`] when the member is unknown.
    pub fn calculate_tier(&self, member_id: &MemberId) -> Result<Tier> {
        if self.store.get_member(member_id)?.is_none() {
            return Err(not_found("member", member_id));
        }
        let spend = self.store.delivered_total_cents(member_id)?;
        Ok(Tier::for_spend(spend))
    }

    /// Set a member's stored tier.
    ///
    /// Returns `false` (without persisting) when the requested tier is
    /// strictly higher than the entitlement computed from spend.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::NotFound`] when the member is unknown.
    pub fn update_tier(&self, member_id: &MemberId, requested: Tier) -> Result<bool> {
        let mut member = self
            .store
            .get_member(member_id)?
            .ok_or_else(|| not_found("member", member_id))?;

        let entitlement = Tier::for_spend(self.store.delivered_total_cents(member_id)?);
        if requested > entitlement {
            tracing::debug!(
                member_id = %member_id,
                requested = %requested,
                entitlement = %entitlement,
                "Tier update rejected"
            );
            return Ok(false);
        }

        member.tier = requested;
        member.updated_at = Utc::now();
        self.store.put_member(&member)?;
        Ok(true)
    }

    /// Sum of the member's delivered-order spend, in cents.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::NotFound`] when the member is unknown.
    pub fn total_spent(&self, member_id: &MemberId) -> Result<i64> {
        if self.store.get_member(member_id)?.is_none() {
            return Err(not_found("member", member_id));
        }
        Ok(self.store.delivered_total_cents(member_id)?)
    }

    /// Sum of `points_earned` across the member's Delivered orders.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::NotFound`] when the member is unknown.
    pub fn total_points_earned(&self, member_id: &MemberId) -> Result<i64> {
        if self.store.get_member(member_id)?.is_none() {
            return Err(not_found("member", member_id));
        }
        Ok(self
            .store
            .list_orders_by_member(member_id)?
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .filter_map(|o| o.points_earned)
            .sum())
    }

    /// List a member's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::NotFound`] when the member is unknown.
    pub fn ledger(
        &self,
        member_id: &MemberId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        if self.store.get_member(member_id)?.is_none() {
            return Err(not_found("member", member_id));
        }
        Ok(self.store.list_ledger_by_member(member_id, limit, offset)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_core::{Order, OrderItem, Product};
    use loyalty_store::MemoryStore;

    fn service() -> (MemberService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (MemberService::new(store.clone()), store)
    }

    fn delivered_order(store: &MemoryStore, member_id: loyalty_core::MemberId, total_cents: i64) {
        let product = Product::new("Item", "An item", total_cents, "SKU", 10, "misc");
        store.put_product(&product).unwrap();

        let mut order = Order::new(member_id, "ship".into(), "bill".into());
        order.items.push(OrderItem {
            product_id: product.id,
            quantity: 1,
            unit_price_cents: total_cents,
            points_earned: None,
        });
        order.subtotal_cents = total_cents;
        order.total_cents = total_cents;
        order.points_earned = Some(total_cents / 100);
        store.place_order(&order).unwrap();
        store.deliver_order(&order.id).unwrap();
    }

    #[test]
    fn create_validates_blank_fields() {
        let (members, _) = service();

        assert!(matches!(
            members.create("", "a@example.com", None, None),
            Err(LoyaltyError::Validation(_))
        ));
        assert!(matches!(
            members.create("Alice", "   ", None, None),
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[test]
    fn create_rejects_duplicate_email() {
        let (members, _) = service();

        members.create("Alice", "alice@example.com", None, None).unwrap();
        assert!(matches!(
            members.create("Eve", "alice@example.com", None, None),
            Err(LoyaltyError::Conflict(_))
        ));
    }

    #[test]
    fn update_preserves_balance_tier_and_join_date() {
        let (members, store) = service();

        let member = members.create("Alice", "alice@example.com", None, None).unwrap();
        store
            .adjust_points(
                &member.id,
                500,
                &LedgerEntry::earn(member.id, 500, "Seed".into()),
            )
            .unwrap();

        let mut edited = store.get_member(&member.id).unwrap().unwrap();
        edited.name = "Alice Smith".into();
        edited.points_balance = 999_999;
        edited.tier = Tier::Platinum;

        let updated = members.update(edited).unwrap();
        assert_eq!(updated.name, "Alice Smith");
        assert_eq!(updated.points_balance, 500);
        assert_eq!(updated.tier, Tier::Standard);
        assert_eq!(updated.joined_at, member.joined_at);
    }

    #[test]
    fn update_rejects_email_of_another_member() {
        let (members, _) = service();

        members.create("Alice", "alice@example.com", None, None).unwrap();
        let bob = members.create("Bob", "bob@example.com", None, None).unwrap();

        let mut edited = bob;
        edited.email = "alice@example.com".into();
        assert!(matches!(
            members.update(edited),
            Err(LoyaltyError::Conflict(_))
        ));
    }

    #[test]
    fn adjust_points_declines_overdraw() {
        let (members, _) = service();

        let member = members.create("Alice", "alice@example.com", None, None).unwrap();
        assert_eq!(members.adjust_points(&member.id, 100, "Bonus").unwrap(), Some(100));
        assert_eq!(members.adjust_points(&member.id, -200, "Too much").unwrap(), None);
        assert_eq!(members.adjust_points(&member.id, -100, "Exact").unwrap(), Some(0));
    }

    #[test]
    fn adjust_points_requires_description() {
        let (members, _) = service();
        let member = members.create("Alice", "alice@example.com", None, None).unwrap();

        assert!(matches!(
            members.adjust_points(&member.id, 10, "  "),
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[test]
    fn adjust_points_unknown_member_is_not_found() {
        let (members, _) = service();
        assert!(matches!(
            members.adjust_points(&MemberId::generate(), 10, "Bonus"),
            Err(LoyaltyError::NotFound { .. })
        ));
    }

    #[test]
    fn tier_follows_delivered_spend() {
        let (members, store) = service();
        let member = members.create("Alice", "alice@example.com", None, None).unwrap();

        assert_eq!(members.calculate_tier(&member.id).unwrap(), Tier::Standard);

        delivered_order(&store, member.id, 1_200_00);
        assert_eq!(members.calculate_tier(&member.id).unwrap(), Tier::Silver);

        delivered_order(&store, member.id, 4_000_00);
        assert_eq!(members.calculate_tier(&member.id).unwrap(), Tier::Gold);

        // Repeated calls with unchanged data return the same tier.
        assert_eq!(members.calculate_tier(&member.id).unwrap(), Tier::Gold);
    }

    #[test]
    fn update_tier_rejects_over_grant() {
        let (members, store) = service();
        let member = members.create("Alice", "alice@example.com", None, None).unwrap();

        assert!(!members.update_tier(&member.id, Tier::Platinum).unwrap());
        assert_eq!(
            store.get_member(&member.id).unwrap().unwrap().tier,
            Tier::Standard
        );

        delivered_order(&store, member.id, 1_500_00);
        assert!(members.update_tier(&member.id, Tier::Silver).unwrap());
        assert_eq!(
            store.get_member(&member.id).unwrap().unwrap().tier,
            Tier::Silver
        );
        // Downgrade below the entitlement is always allowed.
        assert!(members.update_tier(&member.id, Tier::Standard).unwrap());
    }

    #[test]
    fn total_points_earned_sums_delivered_orders() {
        let (members, store) = service();
        let member = members.create("Alice", "alice@example.com", None, None).unwrap();

        assert_eq!(members.total_points_earned(&member.id).unwrap(), 0);

        delivered_order(&store, member.id, 150_00);
        delivered_order(&store, member.id, 49_99);
        assert_eq!(members.total_points_earned(&member.id).unwrap(), 150 + 49);
        assert_eq!(members.total_spent(&member.id).unwrap(), 199_99);
    }

    #[test]
    fn delete_restricted_to_members_without_activity() {
        let (members, _) = service();

        let idle = members.create("Idle", "idle@example.com", None, None).unwrap();
        members.delete(&idle.id).unwrap();
        assert!(members.get(&idle.id).unwrap().is_none());

        let active = members.create("Active", "active@example.com", None, None).unwrap();
        members.adjust_points(&active.id, 10, "Welcome").unwrap();
        assert!(matches!(
            members.delete(&active.id),
            Err(LoyaltyError::Conflict(_))
        ));
        assert!(members.get(&active.id).unwrap().is_some());
    }
}
