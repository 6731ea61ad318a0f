//! Request and Response models for the link API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CreateLinkRequest, EventsQuery, MAX_KEY_LENGTH, MAX_VALUE_LENGTH};
pub use responses::{
    CreateLinkResponse, DeleteResponse, EventsResponse, HealthResponse, LookupResponse,
    ScheduleResponse,
};
