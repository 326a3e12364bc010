//! Storage for schedule blocks.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (crate::services::ScheduleService)        │
//! │  - Request validation                                    │
//! │  - Auto-generation planning                              │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │                              │
//! ┌───▼──────────────┐   ┌───────────▼──────────┐
//! │ Local Repository │   │ Postgres Repository  │
//! │   (in-memory)    │   │  (Diesel + r2d2)     │
//! └──────────────────┘   └──────────────────────┘
//! ```
//!
//! - `repository`: trait definitions and `RepositoryError`
//! - `repositories::local`: in-memory implementation for tests and local development
//! - `repositories::postgres`: Postgres implementation with Diesel ORM
//! - `factory`: creates repository instances from the environment or `repository.toml`
//! - `repo_config`: the TOML configuration file
//!
//! # Usage
//! ```ignore
//! use course_schedule::db::{RepositoryConfig, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RepositoryConfig::load()?;
//!     let repo = RepositoryFactory::from_repository_config(&config).await?;
//!     let slots = repo.list_slots().await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod models;
pub mod repo_config;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresConfig;

pub use models::{BlockQuery, Page};
pub use repo_config::{
    LocalSettings, OfferingSeed, RepositoryConfig, SchedulingSettings, CONFIG_PATH_ENV,
};

// Repository traits and implementations
pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    merge_patch, CatalogRepository, ErrorContext, FullRepository, RepositoryError,
    RepositoryResult, ScheduleRepository,
};
