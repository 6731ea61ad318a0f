//! API Module
//!
//! Thin HTTP adapter over the [`Coordinator`](crate::coordinator::Coordinator).
//! Short codes and absolute expiry instants are supplied by the client.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
