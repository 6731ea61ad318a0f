//! Link Cache - short-link lookups with LRU caching and scheduled expiry
//!
//! A bounded LRU cache and a min-heap of expiry instants sit in front of a
//! durable link store. A [`Coordinator`] owns both structures and a
//! background sweeper reconciles links whose time limit has passed.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod models;
pub mod schedule;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{Coordinator, LookupOutcome};
pub use store::{ExpiryPolicy, LinkStore, MemoryStore};
pub use tasks::{spawn_sweeper, SweeperHandle};
