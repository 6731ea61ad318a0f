//! Link Record Module
//!
//! The persisted link and its expiry policy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Expiry Policy ==
/// When a link stops resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Never expires
    #[default]
    Never,
    /// Expires once the absolute instant is reached
    At { expires_at: DateTime<Utc> },
    /// Expires once `clicks` reaches `max_clicks`
    Clicks { max_clicks: u64, clicks: u64 },
}

impl ExpiryPolicy {
    // == Expired Check ==
    /// Returns why the policy is spent at `now`, or `None` while still valid.
    ///
    /// Time-based expiry is inclusive: at exactly `expires_at` the link is gone.
    pub fn expired(&self, now: DateTime<Utc>) -> Option<ExpiryReason> {
        match self {
            ExpiryPolicy::Never => None,
            ExpiryPolicy::At { expires_at } if now >= *expires_at => Some(ExpiryReason::TimeLimit),
            ExpiryPolicy::At { .. } => None,
            ExpiryPolicy::Clicks { max_clicks, clicks } if clicks >= max_clicks => {
                Some(ExpiryReason::ClickLimit)
            }
            ExpiryPolicy::Clicks { .. } => None,
        }
    }

    /// The absolute instant for time-based policies.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ExpiryPolicy::At { expires_at } => Some(*expires_at),
            _ => None,
        }
    }
}

// == Expiry Reason ==
/// Which limit a link ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    TimeLimit,
    ClickLimit,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryReason::TimeLimit => f.write_str("time limit reached"),
            ExpiryReason::ClickLimit => f.write_str("click limit reached"),
        }
    }
}

// == Link Record ==
/// A short code and the target it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub policy: ExpiryPolicy,
    pub created_at: DateTime<Utc>,
}

impl LinkRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>, policy: ExpiryPolicy) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            policy,
            created_at: Utc::now(),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_never_policy() {
        assert_eq!(ExpiryPolicy::Never.expired(Utc::now()), None);
        assert_eq!(ExpiryPolicy::Never.expires_at(), None);
    }

    #[test]
    fn test_time_policy_boundary() {
        let at = Utc::now();
        let policy = ExpiryPolicy::At { expires_at: at };

        assert_eq!(policy.expired(at - Duration::seconds(1)), None);
        assert_eq!(policy.expired(at), Some(ExpiryReason::TimeLimit));
        assert_eq!(policy.expires_at(), Some(at));
    }

    #[test]
    fn test_click_policy() {
        let now = Utc::now();
        let fresh = ExpiryPolicy::Clicks { max_clicks: 2, clicks: 1 };
        let spent = ExpiryPolicy::Clicks { max_clicks: 2, clicks: 2 };

        assert_eq!(fresh.expired(now), None);
        assert_eq!(spent.expired(now), Some(ExpiryReason::ClickLimit));
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ExpiryReason::TimeLimit.to_string(), "time limit reached");
        assert_eq!(ExpiryReason::ClickLimit.to_string(), "click limit reached");
    }

    #[test]
    fn test_policy_deserialize() {
        let json = r#"{"type":"clicks","max_clicks":5,"clicks":0}"#;
        let policy: ExpiryPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy, ExpiryPolicy::Clicks { max_clicks: 5, clicks: 0 });
    }
}
