//! Points ledger types.
//!
//! Every balance adjustment made through the points operations writes one
//! ledger entry. Entries are append-only and never mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerEntryId, MemberId};

/// An append-only record of a balance-affecting event.
///
/// The entry stores the point magnitude; the sign of the underlying change is
/// carried by [`LedgerEntryType`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry id (ULID for time-ordering).
    pub id: LedgerEntryId,

    /// The member whose balance was affected.
    pub member_id: MemberId,

    /// Point magnitude. Always non-negative.
    pub points: i64,

    /// Type of the event.
    pub entry_type: LedgerEntryType,

    /// Human-readable description.
    pub description: String,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create an earn entry (points added).
    #[must_use]
    pub fn earn(member_id: MemberId, points: i64, description: String) -> Self {
        Self {
            id: LedgerEntryId::generate(),
            member_id,
            points: points.abs(),
            entry_type: LedgerEntryType::Earn,
            description,
            created_at: Utc::now(),
        }
    }

    /// Create a spend entry (points removed).
    #[must_use]
    pub fn spend(member_id: MemberId, points: i64, description: String) -> Self {
        Self {
            id: LedgerEntryId::generate(),
            member_id,
            points: points.abs(),
            entry_type: LedgerEntryType::Spend,
            description,
            created_at: Utc::now(),
        }
    }

    /// Create an expiry entry (points removed by expiration).
    #[must_use]
    pub fn expire(member_id: MemberId, points: i64, description: String) -> Self {
        Self {
            id: LedgerEntryId::generate(),
            member_id,
            points: points.abs(),
            entry_type: LedgerEntryType::Expire,
            description,
            created_at: Utc::now(),
        }
    }

    /// Create a manual adjustment entry.
    #[must_use]
    pub fn adjust(member_id: MemberId, points: i64, description: String) -> Self {
        Self {
            id: LedgerEntryId::generate(),
            member_id,
            points: points.abs(),
            entry_type: LedgerEntryType::Adjust,
            description,
            created_at: Utc::now(),
        }
    }

    /// The signed balance delta this entry represents.
    #[must_use]
    pub const fn signed_points(&self) -> i64 {
        if self.entry_type.is_credit() {
            self.points
        } else {
            -self.points
        }
    }
}

/// Type of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    /// Points earned.
    Earn,

    /// Points spent.
    Spend,

    /// Points removed by expiration.
    Expire,

    /// Manual adjustment (always a credit; debits are recorded as Spend).
    Adjust,
}

impl LedgerEntryType {
    /// Check if this entry type adds points.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Earn | Self::Adjust)
    }

    /// Check if this entry type removes points.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Spend | Self::Expire)
    }
}
