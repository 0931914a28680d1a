//! Registration, login, and current-identity handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use loyalty_core::{Member, User};

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Email address, unique across members and users.
    pub email: String,
    /// Plaintext password; only the bcrypt hash is stored.
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Token response for register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Signed bearer token.
    pub token: String,
    /// The authenticated user id.
    pub user_id: String,
    /// The member record linked to the user.
    pub member_id: String,
    /// Email on the account.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Register a new member with login credentials.
///
/// Creates the member profile and the auth user in that order, so duplicate
/// emails surface as a conflict before any credential is stored.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if body.password.trim().is_empty() {
        return Err(ApiError::BadRequest("password must not be blank".into()));
    }
    if state.store.get_user_by_email(body.email.trim())?.is_some() {
        return Err(ApiError::Conflict(format!(
            "email already registered: {}",
            body.email.trim()
        )));
    }

    let member = state.members.create(&body.name, &body.email, None, None)?;

    let password_hash = auth::hash_password(&body.password)?;
    let user = User::new(
        member.email.clone(),
        password_hash,
        member.name.clone(),
        member.id,
    );
    state.store.put_user(&user)?;

    let token = auth::issue_token(&state.config, &user)?;

    tracing::info!(user_id = %user.id, member_id = %member.id, "User registered");

    Ok(Json(AuthResponse {
        token,
        user_id: user.id.to_string(),
        member_id: member.id.to_string(),
        email: user.email,
        name: user.name,
    }))
}

/// Log in with email and password.
///
/// Unknown emails, wrong passwords, and deactivated users all produce the
/// same unauthorized response.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .store
        .get_user_by_email(body.email.trim())?
        .ok_or(ApiError::Unauthorized)?;

    if !auth::verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }
    if !user.is_active {
        return Err(ApiError::Unauthorized);
    }

    let token = auth::issue_token(&state.config, &user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user_id: user.id.to_string(),
        member_id: user.member_id.to_string(),
        email: user.email,
        name: user.name,
    }))
}

/// Get the member profile behind the presented token.
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Member>, ApiError> {
    let member = state
        .members
        .get(&auth.member_id)?
        .ok_or_else(|| ApiError::NotFound("member not found".into()))?;

    Ok(Json(member))
}
