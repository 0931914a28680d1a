//! Reward catalog and redemption handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use loyalty_core::{Reward, RewardId, RewardType};

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Reward creation request.
#[derive(Debug, Deserialize)]
pub struct CreateRewardRequest {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Points required to redeem. Must be positive.
    pub points_cost: i64,
    /// Kind of benefit the reward grants.
    pub kind: RewardType,
    /// Initial stock. `None` means unlimited.
    pub stock_quantity: Option<u32>,
}

/// Reward update request.
#[derive(Debug, Deserialize)]
pub struct UpdateRewardRequest {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Points required to redeem. Must be positive.
    pub points_cost: i64,
    /// Kind of benefit the reward grants.
    pub kind: RewardType,
    /// Whether the reward can currently be redeemed.
    pub is_active: bool,
}

/// Stock update request. A negative quantity is rejected.
#[derive(Debug, Deserialize)]
pub struct SetRewardStockRequest {
    /// New stock quantity; the reward is active exactly when positive.
    pub quantity: i64,
}

/// Redemption response.
#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    /// The reward redeemed.
    pub reward_id: String,
    /// Points charged.
    pub points_cost: i64,
    /// The member's balance after the redemption.
    pub balance: i64,
}

/// Reward listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListRewardsQuery {
    /// Restrict to rewards currently redeemable.
    #[serde(default)]
    pub active: bool,
    /// Lower bound on points cost.
    pub min_points: Option<i64>,
    /// Upper bound on points cost.
    pub max_points: Option<i64>,
}

/// List rewards, optionally active-only or within a points-cost range.
pub async fn list_rewards(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListRewardsQuery>,
) -> Result<Json<Vec<Reward>>, ApiError> {
    let rewards = match (query.min_points, query.max_points) {
        (Some(min), Some(max)) => state.rewards.list_by_points_range(min, max)?,
        _ if query.active => state.rewards.list_active()?,
        _ => state.rewards.list()?,
    };
    Ok(Json(rewards))
}

/// Get a reward by id.
pub async fn get_reward(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(reward_id): Path<RewardId>,
) -> Result<Json<Reward>, ApiError> {
    let reward = state
        .rewards
        .get(&reward_id)?
        .ok_or_else(|| ApiError::NotFound(format!("reward not found: {reward_id}")))?;
    Ok(Json(reward))
}

/// Redeem a reward for the authenticated member.
///
/// A declined redemption (inactive reward, no stock, or insufficient
/// balance) leaves no partial side effect.
pub async fn redeem_reward(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(reward_id): Path<RewardId>,
) -> Result<Json<RedeemResponse>, ApiError> {
    let reward = state
        .rewards
        .get(&reward_id)?
        .ok_or_else(|| ApiError::NotFound(format!("reward not found: {reward_id}")))?;

    let member = state
        .members
        .get(&auth.member_id)?
        .ok_or_else(|| ApiError::NotFound("member not found".into()))?;

    if member.points_balance < reward.points_cost {
        return Err(ApiError::InsufficientPoints {
            balance: member.points_balance,
            required: reward.points_cost,
        });
    }
    if !state.rewards.redeem(&auth.member_id, &reward_id)? {
        return Err(ApiError::Conflict("reward is inactive or out of stock".into()));
    }

    let balance = state
        .members
        .get(&auth.member_id)?
        .map_or(0, |m| m.points_balance);

    Ok(Json(RedeemResponse {
        reward_id: reward_id.to_string(),
        points_cost: reward.points_cost,
        balance,
    }))
}

/// Add a reward to the catalog (admin).
pub async fn create_reward(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<CreateRewardRequest>,
) -> Result<Json<Reward>, ApiError> {
    let reward = state.rewards.add(
        &body.name,
        &body.description,
        body.points_cost,
        body.kind,
        body.stock_quantity,
    )?;

    tracing::info!(reward_id = %reward.id, admin_id = %admin.admin_id, "Reward created by admin");
    Ok(Json(reward))
}

/// Update a reward (admin). Stock stays as stored; use the stock endpoint
/// to change it.
pub async fn update_reward(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(reward_id): Path<RewardId>,
    Json(body): Json<UpdateRewardRequest>,
) -> Result<Json<Reward>, ApiError> {
    let mut reward = state
        .rewards
        .get(&reward_id)?
        .ok_or_else(|| ApiError::NotFound(format!("reward not found: {reward_id}")))?;

    reward.name = body.name;
    reward.description = body.description;
    reward.points_cost = body.points_cost;
    reward.kind = body.kind;
    reward.is_active = body.is_active;

    let updated = state
        .rewards
        .update(reward)?
        .ok_or_else(|| ApiError::NotFound(format!("reward not found: {reward_id}")))?;
    Ok(Json(updated))
}

/// Delete a reward (admin).
pub async fn delete_reward(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(reward_id): Path<RewardId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.rewards.delete(&reward_id)? {
        return Err(ApiError::NotFound(format!("reward not found: {reward_id}")));
    }
    tracing::info!(reward_id = %reward_id, admin_id = %admin.admin_id, "Reward deleted by admin");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Set a reward's stock level (admin).
pub async fn set_stock(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(reward_id): Path<RewardId>,
    Json(body): Json<SetRewardStockRequest>,
) -> Result<Json<Reward>, ApiError> {
    if body.quantity < 0 {
        return Err(ApiError::BadRequest("quantity must not be negative".into()));
    }
    if !state.rewards.set_stock(&reward_id, body.quantity)? {
        return Err(ApiError::NotFound(format!("reward not found: {reward_id}")));
    }

    let reward = state
        .rewards
        .get(&reward_id)?
        .ok_or_else(|| ApiError::NotFound(format!("reward not found: {reward_id}")))?;
    Ok(Json(reward))
}
