//! Member types for the loyalty platform.
//!
//! A member owns a points balance and a loyalty tier. The tier is derived
//! from cumulative delivered-order spend but stored independently; tier
//! updates may never exceed the entitlement computed from spend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MemberId;

// ============================================================================
// Tier thresholds
// ============================================================================

/// Cumulative delivered-order spend required for Silver, in cents ($1,000).
pub const SILVER_THRESHOLD_CENTS: i64 = 1_000_00;

/// Cumulative delivered-order spend required for Gold, in cents ($5,000).
pub const GOLD_THRESHOLD_CENTS: i64 = 5_000_00;

/// Cumulative delivered-order spend required for Platinum, in cents ($10,000).
pub const PLATINUM_THRESHOLD_CENTS: i64 = 10_000_00;

/// A loyalty member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// The member id.
    pub id: MemberId,

    /// Display name.
    pub name: String,

    /// Email address, unique across members.
    pub email: String,

    /// Current points balance. Never negative.
    pub points_balance: i64,

    /// Current loyalty tier.
    pub tier: Tier,

    /// When the member joined the program.
    pub joined_at: DateTime<Utc>,

    /// Default shipping address, if the member has set one.
    pub shipping_address: Option<String>,

    /// Default billing address, if the member has set one.
    pub billing_address: Option<String>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Create a new member with zero balance and Standard tier.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: MemberId::generate(),
            name: name.into(),
            email: email.into(),
            points_balance: 0,
            tier: Tier::Standard,
            joined_at: now,
            shipping_address: None,
            billing_address: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the member has at least `points` on balance.
    #[must_use]
    pub fn has_sufficient_points(&self, points: i64) -> bool {
        self.points_balance >= points
    }
}

/// Loyalty tiers, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Entry tier for every new member.
    Standard,

    /// Cumulative delivered spend of at least $1,000.
    Silver,

    /// Cumulative delivered spend of at least $5,000.
    Gold,

    /// Cumulative delivered spend of at least $10,000.
    Platinum,
}

impl Tier {
    /// Ordered threshold table, highest first. The first threshold the spend
    /// meets wins.
    const THRESHOLDS: [(i64, Tier); 3] = [
        (PLATINUM_THRESHOLD_CENTS, Tier::Platinum),
        (GOLD_THRESHOLD_CENTS, Tier::Gold),
        (SILVER_THRESHOLD_CENTS, Tier::Silver),
    ];

    /// Compute the tier a cumulative spend (in cents) entitles a member to.
    #[must_use]
    pub fn for_spend(total_cents: i64) -> Self {
        for (threshold, tier) in Self::THRESHOLDS {
            if total_cents >= threshold {
                return tier;
            }
        }
        Tier::Standard
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Standard => "standard",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_member_has_zero_balance_and_standard_tier() {
        let member = Member::new("Alice", "alice@example.com");
        assert_eq!(member.points_balance, 0);
        assert_eq!(member.tier, Tier::Standard);
        assert!(member.shipping_address.is_none());
    }

    #[test]
    fn member_sufficient_points() {
        let mut member = Member::new("Bob", "bob@example.com");
        member.points_balance = 1000;

        assert!(member.has_sufficient_points(500));
        assert!(member.has_sufficient_points(1000));
        assert!(!member.has_sufficient_points(1001));
    }

    #[test]
    fn tier_for_spend_thresholds() {
        assert_eq!(Tier::for_spend(0), Tier::Standard);
        assert_eq!(Tier::for_spend(999_99), Tier::Standard);
        assert_eq!(Tier::for_spend(1_000_00), Tier::Silver);
        assert_eq!(Tier::for_spend(4_999_99), Tier::Silver);
        assert_eq!(Tier::for_spend(5_000_00), Tier::Gold);
        assert_eq!(Tier::for_spend(9_999_99), Tier::Gold);
        assert_eq!(Tier::for_spend(10_000_00), Tier::Platinum);
        assert_eq!(Tier::for_spend(i64::MAX), Tier::Platinum);
    }

    #[test]
    fn tier_is_monotonic_in_spend() {
        let spends = [0, 500_00, 1_000_00, 3_000_00, 5_000_00, 10_000_00, 50_000_00];
        let tiers: Vec<Tier> = spends.iter().map(|s| Tier::for_spend(*s)).collect();
        for pair in tiers.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn tier_ordering() {
        assert!(Tier::Standard < Tier::Silver);
        assert!(Tier::Silver < Tier::Gold);
        assert!(Tier::Gold < Tier::Platinum);
    }
}
