//! Response DTOs for the link API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::coordinator::ScheduledExpiry;
use crate::events::{LogCategory, OperationRecord};
use crate::store::LinkRecord;

/// Response body for a successful lookup (GET /links/:key)
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub key: String,
    pub value: String,
    /// `cache_hit` or `cache_miss_store_hit`
    pub outcome: &'static str,
}

/// Response body for link creation (PUT /links)
#[derive(Debug, Clone, Serialize)]
pub struct CreateLinkResponse {
    pub message: String,
    pub link: LinkRecord,
    /// True when an existing link was returned instead of creating one
    pub deduplicated: bool,
}

impl CreateLinkResponse {
    pub fn created(link: LinkRecord) -> Self {
        Self {
            message: format!("Link '{}' created", link.key),
            link,
            deduplicated: false,
        }
    }

    pub fn existing(link: LinkRecord) -> Self {
        Self {
            message: format!("Reusing existing link '{}'", link.key),
            link,
            deduplicated: true,
        }
    }
}

/// Response body for link deletion (DELETE /links/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Link '{}' deleted", key),
            key,
        }
    }
}

/// Response body for the schedule endpoint (GET /schedule)
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub count: usize,
    pub entries: Vec<ScheduledExpiry>,
}

impl ScheduleResponse {
    pub fn new(entries: Vec<ScheduledExpiry>) -> Self {
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// Response body for event polling (GET /events/:category)
#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub category: LogCategory,
    /// Most recent last
    pub records: Vec<OperationRecord>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
