//! # Course Schedule Backend
//!
//! Allocation and conflict detection for weekly course schedules.
//!
//! A course offering (one teacher, one room, a credit value) is given schedule
//! blocks. Each block holds weekdays and each weekday holds the numbered slots it
//! occupies. Two blocks conflict when their offerings share a teacher or a room and
//! they occupy the same weekday and slot.
//!
//! ## Features
//!
//! - **Manual scheduling**: create, update and delete blocks with full validation
//! - **Conflict detection**: teacher/room collisions reported in full, not first-only
//! - **Auto-generation**: turn credits and a week count into an evenly spread weekly pattern
//! - **Atomic writes**: detection and commit run inside one lock or transaction
//! - **HTTP API**: axum REST endpoints behind the `http-server` feature
//!
//! ## Architecture
//!
//! - [`models`]: block/day/slot value objects and catalog types
//! - [`api`]: request and response types
//! - [`scheduler`]: validation, conflict detection and allocation planning (no I/O)
//! - [`db`]: repository traits, in-memory and Postgres backends, configuration
//! - [`services`]: orchestration of the scheduler over a repository
//! - [`http`]: axum router and handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod db;
pub mod models;
pub mod scheduler;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
