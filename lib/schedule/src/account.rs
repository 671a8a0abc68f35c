//! User accounts, subscription tiers, and capability flags.
//!
//! Capabilities are resolved from the tier once, when the account is
//! constructed, so downstream code checks a plain flag instead of
//! re-deriving tier semantics at every call site.

use chrono::{DateTime, Utc};
use quiet_sentinel_core::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The subscription tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// Free tier.
    #[default]
    Free,
    /// Pro tier.
    Pro,
    /// Max tier.
    Max,
}

impl SubscriptionTier {
    /// Returns the canonical string form, as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTier {
    /// The unrecognized value.
    pub value: String,
}

impl fmt::Display for UnknownTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown subscription tier '{}'", self.value)
    }
}

impl std::error::Error for UnknownTier {}

impl FromStr for SubscriptionTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "max" => Ok(Self::Max),
            _ => Err(UnknownTier {
                value: s.to_string(),
            }),
        }
    }
}

/// Capability flags derived from the subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountCapabilities {
    /// Whether prep artifacts may be enriched with related memory notes.
    pub memory_enrichment: bool,
}

impl From<SubscriptionTier> for AccountCapabilities {
    fn from(tier: SubscriptionTier) -> Self {
        Self {
            memory_enrichment: matches!(tier, SubscriptionTier::Pro | SubscriptionTier::Max),
        }
    }
}

/// A user account as seen by the notification core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The platform user this account belongs to.
    pub user_id: UserId,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Capability flags, derived once from the tier.
    pub capabilities: AccountCapabilities,
    /// IANA timezone name, if configured (e.g., "America/New_York").
    pub timezone: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates an account for a user with the given tier.
    #[must_use]
    pub fn new(user_id: UserId, tier: SubscriptionTier) -> Self {
        Self {
            user_id,
            tier,
            capabilities: tier.into(),
            timezone: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the account's timezone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}
