//! API Routes
//!
//! Configures the Axum router with all link endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_link_handler, delete_handler, events_handler, health_handler, lookup_handler,
    redirect_handler, schedule_handler, stats_handler, AppState,
};
use crate::store::LinkStore;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /links` - Create a link
/// - `GET /links/:key` - Resolve a link as JSON
/// - `DELETE /links/:key` - Delete a link
/// - `GET /r/:key` - Resolve a link as a redirect
/// - `GET /stats` - Cache size, capacity and hit rates
/// - `GET /schedule` - Pending expiries
/// - `GET /events/:category` - Recent operation records (`cache` or `heap`)
/// - `GET /health` - Health check endpoint
pub fn create_router<S: LinkStore>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/links", put(create_link_handler::<S>))
        .route(
            "/links/:key",
            get(lookup_handler::<S>).delete(delete_handler::<S>),
        )
        .route("/r/:key", get(redirect_handler::<S>))
        .route("/stats", get(stats_handler::<S>))
        .route("/schedule", get(schedule_handler::<S>))
        .route("/events/:category", get(events_handler::<S>))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
