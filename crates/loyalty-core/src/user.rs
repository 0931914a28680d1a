//! Auth user type.
//!
//! A plain credential record linked to a member; token issuance and password
//! verification live in the service layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MemberId, UserId};

/// An authentication identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user id.
    pub id: UserId,

    /// Email address, unique across users.
    pub email: String,

    /// Bcrypt password hash. Never serialized into API responses.
    pub password_hash: String,

    /// Display name.
    pub name: String,

    /// The member record this identity belongs to.
    pub member_id: MemberId,

    /// Whether the user may log in.
    pub is_active: bool,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user linked to a member.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        name: impl Into<String>,
        member_id: MemberId,
    ) -> Self {
        Self {
            id: UserId::generate(),
            email: email.into(),
            password_hash: password_hash.into(),
            name: name.into(),
            member_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
