//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweeper: reconciles links whose time limit has passed

mod sweeper;

pub use sweeper::{spawn_sweeper, SweeperHandle};
