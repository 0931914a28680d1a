//! `RocksDB` storage implementation.
//!
//! Records are CBOR-encoded. Secondary indexes (email lookups, by-member
//! listings) live in their own column families; every compound mutation
//! collects its writes into a single `WriteBatch`, which is the transaction
//! scope: the batch commits in full or not at all.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use loyalty_core::{
    LedgerEntry, LedgerEntryId, Member, MemberId, Order, OrderId, OrderStatus, Product, ProductId,
    Reward, RewardId, RewardRedemption, Tier, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!("RocksDB store opened");

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Fetch and decode a single record.
    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Decode every record in a column family.
    fn scan_records<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            records.push(Self::deserialize(&value)?);
        }
        Ok(records)
    }

    /// Collect the index keys under a member prefix.
    fn scan_member_index(&self, cf_name: &str, member_id: &MemberId) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let prefix = keys::member_prefix(member_id);
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut matched = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            matched.push(key.to_vec());
        }
        Ok(matched)
    }

    /// Resolve an email index entry to UUID bytes.
    fn get_email_index(&self, cf_name: &str, email: &str) -> Result<Option<[u8; 16]>> {
        let cf = self.cf(cf_name)?;
        let value = self
            .db
            .get_cf(&cf, keys::email_key(email))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            Some(bytes) if bytes.len() == 16 => {
                let mut id = [0u8; 16];
                id.copy_from_slice(&bytes);
                Ok(Some(id))
            }
            Some(_) => Err(StoreError::Database("corrupt email index entry".into())),
            None => Ok(None),
        }
    }

    /// Queue a ledger entry (record plus by-member index) onto a batch.
    fn batch_ledger_entry(&self, batch: &mut WriteBatch, entry: &LedgerEntry) -> Result<()> {
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_by_member = self.cf(cf::LEDGER_BY_MEMBER)?;
        batch.put_cf(&cf_ledger, keys::ledger_key(&entry.id), Self::serialize(entry)?);
        batch.put_cf(
            &cf_by_member,
            keys::member_ledger_key(&entry.member_id, &entry.id),
            [],
        );
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Member Operations
    // =========================================================================

    fn put_member(&self, member: &Member) -> Result<()> {
        if let Some(existing) = self.get_email_index(cf::MEMBERS_BY_EMAIL, &member.email)? {
            if &existing != member.id.as_bytes() {
                return Err(StoreError::EmailTaken {
                    email: member.email.clone(),
                });
            }
        }

        let cf_members = self.cf(cf::MEMBERS)?;
        let cf_email = self.cf(cf::MEMBERS_BY_EMAIL)?;

        let mut batch = WriteBatch::default();

        // Drop the stale index entry when the email changed.
        if let Some(previous) = self.get_member(&member.id)? {
            if previous.email != member.email {
                batch.delete_cf(&cf_email, keys::email_key(&previous.email));
            }
        }

        batch.put_cf(
            &cf_members,
            keys::member_key(&member.id),
            Self::serialize(member)?,
        );
        batch.put_cf(
            &cf_email,
            keys::email_key(&member.email),
            member.id.as_bytes(),
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_member(&self, member_id: &MemberId) -> Result<Option<Member>> {
        self.get_record(cf::MEMBERS, &keys::member_key(member_id))
    }

    fn get_member_by_email(&self, email: &str) -> Result<Option<Member>> {
        match self.get_email_index(cf::MEMBERS_BY_EMAIL, email)? {
            Some(id) => self.get_record(
                cf::MEMBERS,
                &keys::member_key(&MemberId::from_uuid(uuid::Uuid::from_bytes(id))),
            ),
            None => Ok(None),
        }
    }

    fn delete_member(&self, member_id: &MemberId) -> Result<()> {
        let member = self
            .get_member(member_id)?
            .ok_or_else(|| StoreError::not_found("member", member_id))?;

        let cf_members = self.cf(cf::MEMBERS)?;
        let cf_email = self.cf(cf::MEMBERS_BY_EMAIL)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_members, keys::member_key(member_id));
        batch.delete_cf(&cf_email, keys::email_key(&member.email));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_members(&self) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self.scan_records(cf::MEMBERS)?;
        members.sort_by_key(|m| m.created_at);
        Ok(members)
    }

    fn list_members_by_tier(&self, tier: Tier) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self.scan_records(cf::MEMBERS)?;
        members.retain(|m| m.tier == tier);
        members.sort_by_key(|m| m.created_at);
        Ok(members)
    }

    fn member_has_activity(&self, member_id: &MemberId) -> Result<bool> {
        let has_orders = !self
            .scan_member_index(cf::ORDERS_BY_MEMBER, member_id)?
            .is_empty();
        let has_ledger = !self
            .scan_member_index(cf::LEDGER_BY_MEMBER, member_id)?
            .is_empty();
        Ok(has_orders || has_ledger)
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user(&self, user: &User) -> Result<()> {
        if let Some(existing) = self.get_email_index(cf::USERS_BY_EMAIL, &user.email)? {
            if &existing != user.id.as_bytes() {
                return Err(StoreError::EmailTaken {
                    email: user.email.clone(),
                });
            }
        }

        let cf_users = self.cf(cf::USERS)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;

        let mut batch = WriteBatch::default();

        if let Some(previous) = self.get_user(&user.id)? {
            if previous.email != user.email {
                batch.delete_cf(&cf_email, keys::email_key(&previous.email));
            }
        }

        batch.put_cf(&cf_users, keys::user_key(&user.id), Self::serialize(user)?);
        batch.put_cf(&cf_email, keys::email_key(&user.email), user.id.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        self.get_record(cf::USERS, &keys::user_key(user_id))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.get_email_index(cf::USERS_BY_EMAIL, email)? {
            Some(id) => self.get_record(
                cf::USERS,
                &keys::user_key(&UserId::from_uuid(uuid::Uuid::from_bytes(id))),
            ),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Product Operations
    // =========================================================================

    fn put_product(&self, product: &Product) -> Result<()> {
        let cf = self.cf(cf::PRODUCTS)?;
        self.db
            .put_cf(
                &cf,
                keys::product_key(&product.id),
                Self::serialize(product)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        self.get_record(cf::PRODUCTS, &keys::product_key(product_id))
    }

    fn delete_product(&self, product_id: &ProductId) -> Result<()> {
        if self.get_product(product_id)?.is_none() {
            return Err(StoreError::not_found("product", product_id));
        }

        let cf = self.cf(cf::PRODUCTS)?;
        self.db
            .delete_cf(&cf, keys::product_key(product_id))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.scan_records(cf::PRODUCTS)?;
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    fn list_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.scan_records(cf::PRODUCTS)?;
        products.retain(|p| p.category == category);
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    fn search_products(&self, term: &str) -> Result<Vec<Product>> {
        let needle = term.to_lowercase();
        let mut products: Vec<Product> = self.scan_records(cf::PRODUCTS)?;
        products.retain(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        });
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    fn list_low_stock(&self, threshold: u32) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.scan_records(cf::PRODUCTS)?;
        products.retain(|p| p.stock_quantity <= threshold);
        products.sort_by_key(|p| p.stock_quantity);
        Ok(products)
    }

    // =========================================================================
    // Order Operations
    // =========================================================================

    fn put_order(&self, order: &Order) -> Result<()> {
        let cf_orders = self.cf(cf::ORDERS)?;
        let cf_by_member = self.cf(cf::ORDERS_BY_MEMBER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_orders, keys::order_key(&order.id), Self::serialize(order)?);
        batch.put_cf(
            &cf_by_member,
            keys::member_order_key(&order.member_id, &order.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>> {
        self.get_record(cf::ORDERS, &keys::order_key(order_id))
    }

    fn list_orders(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.scan_records(cf::ORDERS)?;
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    fn list_orders_by_member(&self, member_id: &MemberId) -> Result<Vec<Order>> {
        let mut orders = Vec::new();
        for key in self.scan_member_index(cf::ORDERS_BY_MEMBER, member_id)? {
            let order_id = keys::extract_order_id(&key);
            if let Some(order) = self.get_order(&order_id)? {
                orders.push(order);
            }
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn list_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.scan_records(cf::ORDERS)?;
        orders.retain(|o| o.status == status);
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    fn set_order_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<()> {
        let mut order = self
            .get_order(order_id)?
            .ok_or_else(|| StoreError::not_found("order", order_id))?;
        order.status = status;
        order.updated_at = chrono::Utc::now();
        self.put_order(&order)
    }

    fn delivered_total_cents(&self, member_id: &MemberId) -> Result<i64> {
        Ok(self
            .list_orders_by_member(member_id)?
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .map(|o| o.total_cents)
            .sum())
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_ledger_entry(&self, entry_id: &LedgerEntryId) -> Result<Option<LedgerEntry>> {
        self.get_record(cf::LEDGER, &keys::ledger_key(entry_id))
    }

    fn list_ledger_by_member(
        &self,
        member_id: &MemberId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        // Index keys are time-ordered (ULID suffix); reverse for newest first.
        let mut index_keys = self.scan_member_index(cf::LEDGER_BY_MEMBER, member_id)?;
        index_keys.reverse();

        let mut entries = Vec::new();
        for key in index_keys.into_iter().skip(offset).take(limit) {
            let entry_id = keys::extract_ledger_id(&key);
            if let Some(entry) = self.get_ledger_entry(&entry_id)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    // =========================================================================
    // Reward Operations
    // =========================================================================

    fn put_reward(&self, reward: &Reward) -> Result<()> {
        let cf = self.cf(cf::REWARDS)?;
        self.db
            .put_cf(&cf, keys::reward_key(&reward.id), Self::serialize(reward)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_reward(&self, reward_id: &RewardId) -> Result<Option<Reward>> {
        self.get_record(cf::REWARDS, &keys::reward_key(reward_id))
    }

    fn delete_reward(&self, reward_id: &RewardId) -> Result<()> {
        if self.get_reward(reward_id)?.is_none() {
            return Err(StoreError::not_found("reward", reward_id));
        }

        let cf = self.cf(cf::REWARDS)?;
        self.db
            .delete_cf(&cf, keys::reward_key(reward_id))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_rewards(&self) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self.scan_records(cf::REWARDS)?;
        rewards.sort_by_key(|r| r.created_at);
        Ok(rewards)
    }

    fn list_active_rewards(&self) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self.scan_records(cf::REWARDS)?;
        rewards.retain(|r| r.is_active);
        rewards.sort_by_key(|r| r.created_at);
        Ok(rewards)
    }

    fn list_rewards_by_points_range(
        &self,
        min_points: i64,
        max_points: i64,
    ) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self.scan_records(cf::REWARDS)?;
        rewards.retain(|r| r.points_cost >= min_points && r.points_cost <= max_points);
        rewards.sort_by_key(|r| r.points_cost);
        Ok(rewards)
    }

    fn list_redemptions_by_member(&self, member_id: &MemberId) -> Result<Vec<RewardRedemption>> {
        let cf = self.cf(cf::REDEMPTIONS_BY_MEMBER)?;
        let prefix = keys::member_prefix(member_id);
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut redemptions = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            redemptions.push(Self::deserialize(&value)?);
        }
        // ULID suffix keeps the scan chronological; newest first for callers.
        redemptions.reverse();
        Ok(redemptions)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn adjust_points(&self, member_id: &MemberId, delta: i64, entry: &LedgerEntry) -> Result<i64> {
        let mut member = self
            .get_member(member_id)?
            .ok_or_else(|| StoreError::not_found("member", member_id))?;

        let new_balance = member.points_balance + delta;
        if new_balance < 0 {
            return Err(StoreError::InsufficientPoints {
                balance: member.points_balance,
                required: delta.abs(),
            });
        }

        member.points_balance = new_balance;
        member.updated_at = chrono::Utc::now();

        let cf_members = self.cf(cf::MEMBERS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_members,
            keys::member_key(member_id),
            Self::serialize(&member)?,
        );
        self.batch_ledger_entry(&mut batch, entry)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(new_balance)
    }

    fn place_order(&self, order: &Order) -> Result<()> {
        let mut member = self
            .get_member(&order.member_id)?
            .ok_or_else(|| StoreError::not_found("member", order.member_id))?;

        // All validation happens before the batch is built.
        let mut products = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let product = self
                .get_product(&item.product_id)?
                .ok_or_else(|| StoreError::not_found("product", item.product_id))?;
            if product.stock_quantity < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id.to_string(),
                    available: product.stock_quantity,
                    requested: item.quantity,
                });
            }
            products.push((product, item.quantity));
        }

        let points_used = order.points_used.unwrap_or(0);
        if points_used > member.points_balance {
            return Err(StoreError::InsufficientPoints {
                balance: member.points_balance,
                required: points_used,
            });
        }

        let now = chrono::Utc::now();
        let cf_members = self.cf(cf::MEMBERS)?;
        let cf_products = self.cf(cf::PRODUCTS)?;
        let cf_orders = self.cf(cf::ORDERS)?;
        let cf_by_member = self.cf(cf::ORDERS_BY_MEMBER)?;

        let mut batch = WriteBatch::default();

        for (mut product, quantity) in products {
            product.stock_quantity -= quantity;
            product.updated_at = now;
            batch.put_cf(
                &cf_products,
                keys::product_key(&product.id),
                Self::serialize(&product)?,
            );
        }

        if points_used > 0 {
            member.points_balance -= points_used;
            member.updated_at = now;
            batch.put_cf(
                &cf_members,
                keys::member_key(&order.member_id),
                Self::serialize(&member)?,
            );
            let entry = LedgerEntry::spend(
                order.member_id,
                points_used,
                format!("Points applied to order {}", order.order_number),
            );
            self.batch_ledger_entry(&mut batch, &entry)?;
        }

        batch.put_cf(&cf_orders, keys::order_key(&order.id), Self::serialize(order)?);
        batch.put_cf(
            &cf_by_member,
            keys::member_order_key(&order.member_id, &order.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn deliver_order(&self, order_id: &OrderId) -> Result<()> {
        let mut order = self
            .get_order(order_id)?
            .ok_or_else(|| StoreError::not_found("order", order_id))?;

        // Credit only on the transition into Delivered.
        if order.status == OrderStatus::Delivered {
            return Ok(());
        }

        let mut member = self
            .get_member(&order.member_id)?
            .ok_or_else(|| StoreError::not_found("member", order.member_id))?;

        let now = chrono::Utc::now();
        order.status = OrderStatus::Delivered;
        order.updated_at = now;

        let cf_members = self.cf(cf::MEMBERS)?;
        let cf_orders = self.cf(cf::ORDERS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_orders, keys::order_key(order_id), Self::serialize(&order)?);

        let points_earned = order.points_earned.unwrap_or(0);
        if points_earned > 0 {
            member.points_balance += points_earned;
            member.updated_at = now;
            batch.put_cf(
                &cf_members,
                keys::member_key(&order.member_id),
                Self::serialize(&member)?,
            );
            let entry = LedgerEntry::earn(
                order.member_id,
                points_earned,
                format!("Order {} delivered", order.order_number),
            );
            self.batch_ledger_entry(&mut batch, &entry)?;
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let mut order = self
            .get_order(order_id)?
            .ok_or_else(|| StoreError::not_found("order", order_id))?;

        if !order.status.is_cancellable() {
            return Err(StoreError::Conflict(format!(
                "order {order_id} is {:?} and cannot be cancelled",
                order.status
            )));
        }

        let now = chrono::Utc::now();
        let cf_members = self.cf(cf::MEMBERS)?;
        let cf_products = self.cf(cf::PRODUCTS)?;
        let cf_orders = self.cf(cf::ORDERS)?;

        let mut batch = WriteBatch::default();

        for item in &order.items {
            if let Some(mut product) = self.get_product(&item.product_id)? {
                product.stock_quantity += item.quantity;
                product.updated_at = now;
                batch.put_cf(
                    &cf_products,
                    keys::product_key(&product.id),
                    Self::serialize(&product)?,
                );
            }
        }

        let points_used = order.points_used.unwrap_or(0);
        if points_used > 0 {
            if let Some(mut member) = self.get_member(&order.member_id)? {
                member.points_balance += points_used;
                member.updated_at = now;
                batch.put_cf(
                    &cf_members,
                    keys::member_key(&order.member_id),
                    Self::serialize(&member)?,
                );
                let entry = LedgerEntry::earn(
                    order.member_id,
                    points_used,
                    format!("Points refunded for cancelled order {}", order.order_number),
                );
                self.batch_ledger_entry(&mut batch, &entry)?;
            }
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        batch.put_cf(&cf_orders, keys::order_key(order_id), Self::serialize(&order)?);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn redeem_reward(
        &self,
        member_id: &MemberId,
        reward_id: &RewardId,
        redemption: &RewardRedemption,
    ) -> Result<()> {
        let mut member = self
            .get_member(member_id)?
            .ok_or_else(|| StoreError::not_found("member", member_id))?;

        let mut reward = self
            .get_reward(reward_id)?
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

        let now = chrono::Utc::now();
        member.points_balance -= reward.points_cost;
        member.updated_at = now;

        if let Some(qty) = reward.stock_quantity {
            let remaining = qty.saturating_sub(1);
            reward.stock_quantity = Some(remaining);
            if remaining == 0 {
                reward.is_active = false;
            }
        }
        reward.updated_at = now;

        let cf_members = self.cf(cf::MEMBERS)?;
        let cf_rewards = self.cf(cf::REWARDS)?;
        let cf_redemptions = self.cf(cf::REDEMPTIONS_BY_MEMBER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_members,
            keys::member_key(member_id),
            Self::serialize(&member)?,
        );
        batch.put_cf(
            &cf_rewards,
            keys::reward_key(reward_id),
            Self::serialize(&reward)?,
        );
        batch.put_cf(
            &cf_redemptions,
            keys::member_redemption_key(member_id, &redemption.id),
            Self::serialize(redemption)?,
        );

        let entry = LedgerEntry::spend(
            *member_id,
            reward.points_cost,
            format!("Redeemed reward {}", reward.name),
        );
        self.batch_ledger_entry(&mut batch, &entry)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
