//! API Handlers
//!
//! HTTP request handlers translating requests into coordinator calls.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::config::Config;
use crate::coordinator::{Coordinator, LookupOutcome, StatsSnapshot};
use crate::error::{LinkError, Result};
use crate::events::LogCategory;
use crate::models::{
    CreateLinkRequest, CreateLinkResponse, DeleteResponse, EventsQuery, EventsResponse,
    HealthResponse, LookupResponse, ScheduleResponse,
};
use crate::store::LinkStore;

/// Application state shared across all handlers.
pub struct AppState<S> {
    /// The coordinator every handler acts through
    pub coordinator: Arc<Coordinator<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<S: LinkStore> AppState<S> {
    /// Wraps an already shared coordinator.
    pub fn new(coordinator: Arc<Coordinator<S>>) -> Self {
        Self { coordinator }
    }

    /// Builds a coordinator over `store` from configuration.
    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(Arc::new(Coordinator::new(store, config)))
    }
}

/// Resolves a key to its target or the matching error.
async fn resolve<S: LinkStore>(state: &AppState<S>, key: &str) -> Result<(String, &'static str)> {
    let outcome = state.coordinator.lookup(key).await?;
    let label = outcome.label();
    match outcome {
        LookupOutcome::CacheHit(value) | LookupOutcome::CacheMissStoreHit(value) => {
            Ok((value, label))
        }
        LookupOutcome::NotFound => Err(LinkError::NotFound(key.to_string())),
        LookupOutcome::Expired(reason) => Err(LinkError::Expired(format!("{} ({})", key, reason))),
    }
}

/// Handler for PUT /links
///
/// Stores a link and schedules its expiry. With `dedup` set, a live link
/// already pointing at the same target is returned instead.
pub async fn create_link_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<CreateLinkRequest>,
) -> Result<Json<CreateLinkResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(LinkError::InvalidRequest(error_msg));
    }

    if req.dedup {
        if let Some(existing) = state.coordinator.find_existing(&req.value).await? {
            return Ok(Json(CreateLinkResponse::existing(existing)));
        }
    }

    let policy = req.policy();
    let link = state.coordinator.insert(req.key, req.value, policy).await?;
    Ok(Json(CreateLinkResponse::created(link)))
}

/// Handler for GET /links/:key
pub async fn lookup_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Json<LookupResponse>> {
    let (value, outcome) = resolve(&state, &key).await?;
    Ok(Json(LookupResponse {
        key,
        value,
        outcome,
    }))
}

/// Handler for GET /r/:key
///
/// Redirects to the link target.
pub async fn redirect_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Redirect> {
    let (value, _) = resolve(&state, &key).await?;
    Ok(Redirect::temporary(&value))
}

/// Handler for DELETE /links/:key
///
/// Deletes the stored link, then drops it from the cache and schedule.
pub async fn delete_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.coordinator.delete(&key).await?;

    if deleted {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(LinkError::NotFound(key))
    }
}

/// Handler for GET /stats
pub async fn stats_handler<S: LinkStore>(State(state): State<AppState<S>>) -> Json<StatsSnapshot> {
    Json(state.coordinator.stats().await)
}

/// Handler for GET /schedule
///
/// Returns pending expiries, soonest first.
pub async fn schedule_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
) -> Json<ScheduleResponse> {
    Json(ScheduleResponse::new(
        state.coordinator.schedule_snapshot().await,
    ))
}

/// Handler for GET /events/:category
///
/// Polling access to the operation log.
pub async fn events_handler<S: LinkStore>(
    State(state): State<AppState<S>>,
    Path(category): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>> {
    let category: LogCategory = category.parse().map_err(LinkError::InvalidRequest)?;
    Ok(Json(EventsResponse {
        category,
        records: state.coordinator.recent_events(category, query.limit),
    }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
