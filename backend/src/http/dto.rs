//! Data Transfer Objects for the HTTP API.
//!
//! Request and response bodies live in `crate::api` and are shared with the service
//! layer; only HTTP-specific envelopes are defined here.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    AutoGenerateOutcome, AutoGenerateRequest, ConflictCheckRequest, ConflictCheckResponse,
    CreateBlockRequest, DeleteBlockResponse, ListBlocksQuery, Page, ScheduleBlock,
    SlotDefinition, UpdateBlockRequest, WeekdayInfo,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Slot catalog response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListResponse {
    pub slots: Vec<SlotDefinition>,
}

/// Weekday catalog response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdayListResponse {
    pub weekdays: Vec<WeekdayInfo>,
}
