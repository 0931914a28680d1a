//! Member, points, and tier handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use loyalty_core::{LedgerEntry, Member, MemberId, RewardRedemption, Tier};

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Profile update request. Balance, tier, and join date are not settable
/// here; the service preserves them from the stored record.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Default shipping address.
    pub shipping_address: Option<String>,
    /// Default billing address.
    pub billing_address: Option<String>,
}

/// Points summary for a member.
#[derive(Debug, Serialize)]
pub struct PointsSummary {
    /// The member id.
    pub member_id: String,
    /// Current balance.
    pub balance: i64,
    /// Points earned across delivered orders.
    pub total_earned: i64,
    /// Cumulative delivered-order spend in cents.
    pub total_spent_cents: i64,
}

/// Stored and computed tier for a member.
#[derive(Debug, Serialize)]
pub struct TierResponse {
    /// The member id.
    pub member_id: String,
    /// Tier currently stored on the member.
    pub tier: Tier,
    /// Tier the delivered-order spend entitles the member to.
    pub entitlement: Tier,
}

/// Admin points adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustPointsRequest {
    /// Signed point delta.
    pub delta: i64,
    /// Reason recorded on the ledger entry.
    pub description: String,
}

/// Points adjustment response.
#[derive(Debug, Serialize)]
pub struct AdjustPointsResponse {
    /// Balance after the adjustment.
    pub balance: i64,
}

/// Admin tier update request.
#[derive(Debug, Deserialize)]
pub struct UpdateTierRequest {
    /// The tier to set.
    pub tier: Tier,
}

/// Ledger listing query parameters.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// Maximum entries to return (default 50).
    pub limit: Option<usize>,
    /// Entries to skip (default 0).
    pub offset: Option<usize>,
}

/// Member listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListMembersQuery {
    /// Restrict to members holding this tier.
    pub tier: Option<Tier>,
}

/// List members, optionally filtered by tier.
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListMembersQuery>,
) -> Result<Json<Vec<Member>>, ApiError> {
    let members = match query.tier {
        Some(tier) => state.members.list_by_tier(tier)?,
        None => state.members.list()?,
    };
    Ok(Json(members))
}

/// Get a member by id.
pub async fn get_member(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(member_id): Path<MemberId>,
) -> Result<Json<Member>, ApiError> {
    let member = state
        .members
        .get(&member_id)?
        .ok_or_else(|| ApiError::NotFound(format!("member not found: {member_id}")))?;
    Ok(Json(member))
}

/// Update a member's profile.
///
/// Members may only edit their own profile; an admin key bypasses that
/// check via the admin routes.
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(member_id): Path<MemberId>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<Member>, ApiError> {
    if auth.member_id != member_id {
        return Err(ApiError::Forbidden);
    }

    let mut member = state
        .members
        .get(&member_id)?
        .ok_or_else(|| ApiError::NotFound(format!("member not found: {member_id}")))?;

    member.name = body.name;
    member.email = body.email;
    member.shipping_address = body.shipping_address;
    member.billing_address = body.billing_address;

    let updated = state.members.update(member)?;
    Ok(Json(updated))
}

/// Delete a member (admin).
///
/// Restricted: members with orders or ledger entries cannot be deleted.
pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(member_id): Path<MemberId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.members.delete(&member_id)?;
    tracing::info!(member_id = %member_id, admin_id = %admin.admin_id, "Member deleted by admin");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Get a member's points summary.
pub async fn get_points(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(member_id): Path<MemberId>,
) -> Result<Json<PointsSummary>, ApiError> {
    let member = state
        .members
        .get(&member_id)?
        .ok_or_else(|| ApiError::NotFound(format!("member not found: {member_id}")))?;

    Ok(Json(PointsSummary {
        member_id: member_id.to_string(),
        balance: member.points_balance,
        total_earned: state.members.total_points_earned(&member_id)?,
        total_spent_cents: state.members.total_spent(&member_id)?,
    }))
}

/// List a member's ledger entries, newest first.
pub async fn get_ledger(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(member_id): Path<MemberId>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);
    Ok(Json(state.members.ledger(&member_id, limit, offset)?))
}

/// Get a member's stored tier and computed entitlement.
pub async fn get_tier(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(member_id): Path<MemberId>,
) -> Result<Json<TierResponse>, ApiError> {
    let member = state
        .members
        .get(&member_id)?
        .ok_or_else(|| ApiError::NotFound(format!("member not found: {member_id}")))?;

    Ok(Json(TierResponse {
        member_id: member_id.to_string(),
        tier: member.tier,
        entitlement: state.members.calculate_tier(&member_id)?,
    }))
}

/// Set a member's tier (admin).
///
/// Rejected when the requested tier exceeds the entitlement computed from
/// delivered-order spend.
pub async fn update_tier(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(member_id): Path<MemberId>,
    Json(body): Json<UpdateTierRequest>,
) -> Result<Json<TierResponse>, ApiError> {
    if !state.members.update_tier(&member_id, body.tier)? {
        return Err(ApiError::Conflict(format!(
            "requested tier {} exceeds the member's entitlement",
            body.tier
        )));
    }

    tracing::info!(
        member_id = %member_id,
        tier = %body.tier,
        admin_id = %admin.admin_id,
        "Tier updated by admin"
    );

    Ok(Json(TierResponse {
        member_id: member_id.to_string(),
        tier: body.tier,
        entitlement: state.members.calculate_tier(&member_id)?,
    }))
}

/// Adjust a member's points balance (admin).
///
/// Declined adjustments (the balance would go negative) surface as an
/// insufficient-points response with no side effect.
pub async fn adjust_points(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(member_id): Path<MemberId>,
    Json(body): Json<AdjustPointsRequest>,
) -> Result<Json<AdjustPointsResponse>, ApiError> {
    match state
        .members
        .adjust_points(&member_id, body.delta, &body.description)?
    {
        Some(balance) => {
            tracing::info!(
                member_id = %member_id,
                delta = body.delta,
                admin_id = %admin.admin_id,
                "Points adjusted by admin"
            );
            Ok(Json(AdjustPointsResponse { balance }))
        }
        None => {
            let balance = state
                .members
                .get(&member_id)?
                .map_or(0, |m| m.points_balance);
            Err(ApiError::InsufficientPoints {
                balance,
                required: -body.delta,
            })
        }
    }
}

/// List a member's reward redemptions, newest first.
pub async fn get_redemptions(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(member_id): Path<MemberId>,
) -> Result<Json<Vec<RewardRedemption>>, ApiError> {
    if state.members.get(&member_id)?.is_none() {
        return Err(ApiError::NotFound(format!("member not found: {member_id}")));
    }
    Ok(Json(state.rewards.member_redemptions(&member_id)?))
}
