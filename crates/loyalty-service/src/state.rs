//! Application state.

use std::sync::Arc;

use loyalty_store::Store;

use crate::config::ServiceConfig;
use crate::services::{MemberService, OrderService, ProductService, RewardService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Member and points operations.
    pub members: MemberService,

    /// Order lifecycle operations.
    pub orders: OrderService,

    /// Product catalog operations.
    pub products: ProductService,

    /// Reward catalog and redemption operations.
    pub rewards: RewardService,
}

impl AppState {
    /// Create a new application state over a storage backend.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        if config.admin_api_key.is_none() {
            tracing::warn!("ADMIN_API_KEY not set - admin endpoints will reject all requests");
        }

        Self {
            members: MemberService::new(Arc::clone(&store)),
            orders: OrderService::new(Arc::clone(&store)),
            products: ProductService::new(Arc::clone(&store)),
            rewards: RewardService::new(Arc::clone(&store)),
            store,
            config,
        }
    }
}
