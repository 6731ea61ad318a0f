//! Request DTOs for the link API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::store::ExpiryPolicy;

/// Maximum accepted short-code length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum accepted target length in bytes
pub const MAX_VALUE_LENGTH: usize = 8 * 1024;

/// Request body for creating a link (PUT /links)
///
/// The caller chooses the short code and supplies an already computed
/// absolute expiry instant or a click limit, never both.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkRequest {
    /// The short code
    pub key: String,
    /// The target the code resolves to
    pub value: String,
    /// Absolute instant after which the link stops resolving
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Number of successful lookups after which the link stops resolving
    #[serde(default)]
    pub max_clicks: Option<u64>,
    /// Return an existing live link for the same target instead of creating one
    #[serde(default)]
    pub dedup: bool,
}

impl CreateLinkRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.value.is_empty() {
            return Some("Value cannot be empty".to_string());
        }
        if self.value.len() > MAX_VALUE_LENGTH {
            return Some(format!(
                "Value exceeds maximum length of {} bytes",
                MAX_VALUE_LENGTH
            ));
        }
        if self.expires_at.is_some() && self.max_clicks.is_some() {
            return Some("Use either expires_at or max_clicks, not both".to_string());
        }
        if self.max_clicks == Some(0) {
            return Some("max_clicks must be at least 1".to_string());
        }
        None
    }

    /// The expiry policy described by the request.
    pub fn policy(&self) -> ExpiryPolicy {
        match (self.expires_at, self.max_clicks) {
            (Some(expires_at), _) => ExpiryPolicy::At { expires_at },
            (None, Some(max_clicks)) => ExpiryPolicy::Clicks {
                max_clicks,
                clicks: 0,
            },
            (None, None) => ExpiryPolicy::Never,
        }
    }
}

/// Query string for GET /events/:category
#[derive(Debug, Clone, Deserialize)]
pub struct EventsQuery {
    /// Number of records to return (default 20)
    #[serde(default = "default_event_limit")]
    pub limit: usize,
}

fn default_event_limit() -> usize {
    20
}
