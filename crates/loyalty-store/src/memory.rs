//! In-memory storage implementation.
//!
//! Entities live in arena-style maps keyed by id, with relations expressed as
//! id fields and resolved through lookups. A single `RwLock` guards the whole
//! arena: compound mutations take the write guard once, so every validation
//! and write inside them observes and produces a consistent state.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use loyalty_core::{
    LedgerEntry, LedgerEntryId, Member, MemberId, Order, OrderId, OrderStatus, Product, ProductId,
    Reward, RewardId, RewardRedemption, Tier, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Debug, Default)]
struct Arena {
    members: HashMap<MemberId, Member>,
    members_by_email: HashMap<String, MemberId>,
    users: HashMap<UserId, User>,
    users_by_email: HashMap<String, UserId>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    /// Ledger entries per member, in append (chronological) order.
    ledger: HashMap<MemberId, Vec<LedgerEntry>>,
    rewards: HashMap<RewardId, Reward>,
    /// Redemptions per member, in append (chronological) order.
    redemptions: HashMap<MemberId, Vec<RewardRedemption>>,
}

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: RwLock<Arena>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arena>> {
        self.arena
            .read()
            .map_err(|_| StoreError::Database("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arena>> {
        self.arena
            .write()
            .map_err(|_| StoreError::Database("lock poisoned".into()))
    }
}

/// Validate stock for every line of an order against the arena.
///
/// Runs before any mutation so a failing line leaves the arena untouched.
fn check_order_stock(arena: &Arena, order: &Order) -> Result<()> {
    for item in &order.items {
        let product = arena
            .products
            .get(&item.product_id)
            .ok_or_else(|| StoreError::not_found("product", item.product_id))?;
        if product.stock_quantity < item.quantity {
            return Err(StoreError::InsufficientStock {
                product_id: item.product_id.to_string(),
                available: product.stock_quantity,
                requested: item.quantity,
            });
        }
    }
    Ok(())
}

impl Store for MemoryStore {
    // =========================================================================
    // Member Operations
    // =========================================================================

    fn put_member(&self, member: &Member) -> Result<()> {
        let mut arena = self.write()?;

        if let Some(existing) = arena.members_by_email.get(&member.email) {
            if *existing != member.id {
                return Err(StoreError::EmailTaken {
                    email: member.email.clone(),
                });
            }
        }

        // Drop the stale index entry when the email changed.
        if let Some(previous) = arena.members.get(&member.id) {
            if previous.email != member.email {
                let old_email = previous.email.clone();
                arena.members_by_email.remove(&old_email);
            }
        }

        arena
            .members_by_email
            .insert(member.email.clone(), member.id);
        arena.members.insert(member.id, member.clone());
        Ok(())
    }

    fn get_member(&self, member_id: &MemberId) -> Result<Option<Member>> {
        Ok(self.read()?.members.get(member_id).cloned())
    }

    fn get_member_by_email(&self, email: &str) -> Result<Option<Member>> {
        let arena = self.read()?;
        Ok(arena
            .members_by_email
            .get(email)
            .and_then(|id| arena.members.get(id))
            .cloned())
    }

    fn delete_member(&self, member_id: &MemberId) -> Result<()> {
        let mut arena = self.write()?;
        let member = arena
            .members
            .remove(member_id)
            .ok_or_else(|| StoreError::not_found("member", member_id))?;
        arena.members_by_email.remove(&member.email);
        Ok(())
    }

    fn list_members(&self) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self.read()?.members.values().cloned().collect();
        members.sort_by_key(|m| m.created_at);
        Ok(members)
    }

    fn list_members_by_tier(&self, tier: Tier) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self
            .read()?
            .members
            .values()
            .filter(|m| m.tier == tier)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.created_at);
        Ok(members)
    }

    fn member_has_activity(&self, member_id: &MemberId) -> Result<bool> {
        let arena = self.read()?;
        let has_orders = arena.orders.values().any(|o| o.member_id == *member_id);
        let has_ledger = arena
            .ledger
            .get(member_id)
            .is_some_and(|entries| !entries.is_empty());
        Ok(has_orders || has_ledger)
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user(&self, user: &User) -> Result<()> {
        let mut arena = self.write()?;

        if let Some(existing) = arena.users_by_email.get(&user.email) {
            if *existing != user.id {
                return Err(StoreError::EmailTaken {
                    email: user.email.clone(),
                });
            }
        }

        if let Some(previous) = arena.users.get(&user.id) {
            if previous.email != user.email {
                let old_email = previous.email.clone();
                arena.users_by_email.remove(&old_email);
            }
        }

        arena.users_by_email.insert(user.email.clone(), user.id);
        arena.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let arena = self.read()?;
        Ok(arena
            .users_by_email
            .get(email)
            .and_then(|id| arena.users.get(id))
            .cloned())
    }

    // =========================================================================
    // Product Operations
    // =========================================================================

    fn put_product(&self, product: &Product) -> Result<()> {
        self.write()?.products.insert(product.id, product.clone());
        Ok(())
    }

    fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.read()?.products.get(product_id).cloned())
    }

    fn delete_product(&self, product_id: &ProductId) -> Result<()> {
        self.write()?
            .products
            .remove(product_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("product", product_id))
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.read()?.products.values().cloned().collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    fn list_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self
            .read()?
            .products
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    fn search_products(&self, term: &str) -> Result<Vec<Product>> {
        let needle = term.to_lowercase();
        let mut products: Vec<Product> = self
            .read()?
            .products
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    fn list_low_stock(&self, threshold: u32) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self
            .read()?
            .products
            .values()
            .filter(|p| p.stock_quantity <= threshold)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.stock_quantity);
        Ok(products)
    }

    // =========================================================================
    // Order Operations
    // =========================================================================

    fn put_order(&self, order: &Order) -> Result<()> {
        self.write()?.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        Ok(self.read()?.orders.get(order_id).cloned())
    }

    fn list_orders(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.read()?.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    fn list_orders_by_member(&self, member_id: &MemberId) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.member_id == *member_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn list_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    fn set_order_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<()> {
        let mut arena = self.write()?;
        let order = arena
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::not_found("order", order_id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    fn delivered_total_cents(&self, member_id: &MemberId) -> Result<i64> {
        Ok(self
            .read()?
            .orders
            .values()
            .filter(|o| o.member_id == *member_id && o.status == OrderStatus::Delivered)
            .map(|o| o.total_cents)
            .sum())
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_ledger_entry(&self, entry_id: &LedgerEntryId) -> Result<Option<LedgerEntry>> {
        Ok(self
            .read()?
            .ledger
            .values()
            .flatten()
            .find(|entry| entry.id == *entry_id)
            .cloned())
    }

    fn list_ledger_by_member(
        &self,
        member_id: &MemberId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let arena = self.read()?;
        let entries = arena.ledger.get(member_id).map_or(&[][..], Vec::as_slice);
        Ok(entries
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Reward Operations
    // =========================================================================

    fn put_reward(&self, reward: &Reward) -> Result<()> {
        self.write()?.rewards.insert(reward.id, reward.clone());
        Ok(())
    }

    fn get_reward(&self, reward_id: &RewardId) -> Result<Option<Reward>> {
        Ok(self.read()?.rewards.get(reward_id).cloned())
    }

    fn delete_reward(&self, reward_id: &RewardId) -> Result<()> {
        self.write()?
            .rewards
            .remove(reward_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("reward", reward_id))
    }

    fn list_rewards(&self) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self.read()?.rewards.values().cloned().collect();
        rewards.sort_by_key(|r| r.created_at);
        Ok(rewards)
    }

    fn list_active_rewards(&self) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self
            .read()?
            .rewards
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        rewards.sort_by_key(|r| r.created_at);
        Ok(rewards)
    }

    fn list_rewards_by_points_range(
        &self,
        min_points: i64,
        max_points: i64,
    ) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self
            .read()?
            .rewards
            .values()
            .filter(|r| r.points_cost >= min_points && r.points_cost <= max_points)
            .cloned()
            .collect();
        rewards.sort_by_key(|r| r.points_cost);
        Ok(rewards)
    }

    fn list_redemptions_by_member(&self, member_id: &MemberId) -> Result<Vec<RewardRedemption>> {
        let arena = self.read()?;
        let redemptions = arena
            .redemptions
            .get(member_id)
            .map_or(&[][..], Vec::as_slice);
        Ok(redemptions.iter().rev().cloned().collect())
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn adjust_points(&self, member_id: &MemberId, delta: i64, entry: &LedgerEntry) -> Result<i64> {
        let mut arena = self.write()?;

        let member = arena
            .members
            .get_mut(member_id)
            .ok_or_else(|| StoreError::not_found("member", member_id))?;

        let new_balance = member.points_balance + delta;
        if new_balance < 0 {
            return Err(StoreError::InsufficientPoints {
                balance: member.points_balance,
                required: delta.abs(),
            });
        }

        member.points_balance = new_balance;
        member.updated_at = Utc::now();
        arena.ledger.entry(*member_id).or_default().push(entry.clone());

        Ok(new_balance)
    }

    fn place_order(&self, order: &Order) -> Result<()> {
        let mut arena = self.write()?;

        // All validation happens before the first mutation.
        let member = arena
            .members
            .get(&order.member_id)
            .ok_or_else(|| StoreError::not_found("member", order.member_id))?;

        check_order_stock(&arena, order)?;

        let points_used = order.points_used.unwrap_or(0);
        if points_used > member.points_balance {
            return Err(StoreError::InsufficientPoints {
                balance: member.points_balance,
                required: points_used,
            });
        }

        let now = Utc::now();
        for item in &order.items {
            // Stock was validated above; the lookup cannot fail under the
            // same write guard.
            if let Some(product) = arena.products.get_mut(&item.product_id) {
                product.stock_quantity -= item.quantity;
                product.updated_at = now;
            }
        }

        if points_used > 0 {
            if let Some(member) = arena.members.get_mut(&order.member_id) {
                member.points_balance -= points_used;
                member.updated_at = now;
            }
            let entry = LedgerEntry::spend(
                order.member_id,
                points_used,
                format!("Points applied to order {}", order.order_number),
            );
            arena.ledger.entry(order.member_id).or_default().push(entry);
        }

        arena.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn deliver_order(&self, order_id: &OrderId) -> Result<()> {
        let mut arena = self.write()?;

        let order = arena
            .orders
            .get(order_id)
            .ok_or_else(|| StoreError::not_found("order", order_id))?;

        // Credit only on the transition into Delivered.
        if order.status == OrderStatus::Delivered {
            return Ok(());
        }

        let member_id = order.member_id;
        let points_earned = order.points_earned.unwrap_or(0);
        let order_number = order.order_number.clone();

        if !arena.members.contains_key(&member_id) {
            return Err(StoreError::not_found("member", member_id));
        }

        let now = Utc::now();
        if let Some(order) = arena.orders.get_mut(order_id) {
            order.status = OrderStatus::Delivered;
            order.updated_at = now;
        }
        if points_earned > 0 {
            if let Some(member) = arena.members.get_mut(&member_id) {
                member.points_balance += points_earned;
                member.updated_at = now;
            }
            let entry = LedgerEntry::earn(
                member_id,
                points_earned,
                format!("Order {order_number} delivered"),
            );
            arena.ledger.entry(member_id).or_default().push(entry);
        }

        Ok(())
    }

    fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let mut arena = self.write()?;

        let order = arena
            .orders
            .get(order_id)
            .ok_or_else(|| StoreError::not_found("order", order_id))?;

        if !order.status.is_cancellable() {
            return Err(StoreError::Conflict(format!(
                "order {order_id} is {:?} and cannot be cancelled",
                order.status
            )));
        }

        let member_id = order.member_id;
        let points_used = order.points_used.unwrap_or(0);
        let order_number = order.order_number.clone();
        let items = order.items.clone();

        let now = Utc::now();
        for item in &items {
            if let Some(product) = arena.products.get_mut(&item.product_id) {
                product.stock_quantity += item.quantity;
                product.updated_at = now;
            }
        }

        if points_used > 0 {
            if let Some(member) = arena.members.get_mut(&member_id) {
                member.points_balance += points_used;
                member.updated_at = now;
            }
            let entry = LedgerEntry::earn(
                member_id,
                points_used,
                format!("Points refunded for cancelled order {order_number}"),
            );
            arena.ledger.entry(member_id).or_default().push(entry);
        }

        if let Some(order) = arena.orders.get_mut(order_id) {
            order.status = OrderStatus::Cancelled;
            order.updated_at = now;
        }

        Ok(())
    }

    fn redeem_reward(
        &self,
        member_id: &MemberId,
        reward_id: &RewardId,
        redemption: &RewardRedemption,
    ) -> Result<()> {
        let mut arena = self.write()?;

        let member = arena
            .members
            .get(member_id)
            .ok_or_else(|| StoreError::not_found("member", member_id))?;

        let reward = arena
            .rewards
            .get(reward_id)
            .ok_or_else(|| StoreError::not_found("reward", reward_id))?;

        if !reward.is_active {
            return Err(StoreError::Conflict(format!(
                "reward {reward_id} is not active"
            )));
        }
        if !reward.has_stock() {
            return Err(StoreError::Conflict(format!(
                "reward {reward_id} is out of stock"
            )));
        }
        if member.points_balance < reward.points_cost {
            return Err(StoreError::InsufficientPoints {
                balance: member.points_balance,
                required: reward.points_cost,
            });
        }

        let points_cost = reward.points_cost;
        let reward_name = reward.name.clone();
        let now = Utc::now();

        if let Some(member) = arena.members.get_mut(member_id) {
            member.points_balance -= points_cost;
            member.updated_at = now;
        }

        if let Some(reward) = arena.rewards.get_mut(reward_id) {
            if let Some(qty) = reward.stock_quantity {
                let remaining = qty.saturating_sub(1);
                reward.stock_quantity = Some(remaining);
                if remaining == 0 {
                    reward.is_active = false;
                }
            }
            reward.updated_at = now;
        }

        let entry = LedgerEntry::spend(
            *member_id,
            points_cost,
            format!("Redeemed reward {reward_name}"),
        );
        arena.ledger.entry(*member_id).or_default().push(entry);

        arena
            .redemptions
            .entry(*member_id)
            .or_default()
            .push(redemption.clone());

        Ok(())
    }
}
