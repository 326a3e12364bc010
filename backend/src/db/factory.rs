//! Builds the repository selected by `repository.toml` or the environment.

use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::{LocalSettings, RepositoryConfig};
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
#[cfg(feature = "postgres-repo")]
use super::PostgresConfig;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl RepositoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Local => "local",
        }
    }

    /// `REPOSITORY_TYPE` when set, else Postgres when a database URL is present,
    /// else Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Accepts "postgres", "pg" and "local", case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

/// Creates repository instances behind `Arc<dyn FullRepository>`.
///
/// # Example
/// ```ignore
/// use course_schedule::db::{RepositoryConfig, RepositoryFactory};
///
/// let config = RepositoryConfig::load()?;
/// let repo = RepositoryFactory::from_repository_config(&config).await?;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Connect to Postgres and run pending migrations.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let repo = PostgresRepository::new(config.clone())?;
        Ok(Arc::new(repo))
    }

    /// Create an in-memory local repository preloaded with the configured offerings.
    pub fn create_local_with(settings: &LocalSettings) -> Arc<dyn FullRepository> {
        let repo = LocalRepository::with_offerings(settings.seed_offerings());
        log::info!(
            "Local repository seeded with {} course offerings",
            settings.offerings.len()
        );
        Arc::new(repo)
    }

    /// Create the repository described by `config`.
    ///
    /// A Postgres configuration with an empty `database_url` falls back to the
    /// `DATABASE_URL` / `PG_DATABASE_URL` environment variables.
    pub async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        match repo_type {
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let pg_config = if config.postgres.database_url.is_empty() {
                        PostgresConfig::from_env().map_err(RepositoryError::configuration)?
                    } else {
                        config.to_postgres_config()?.ok_or_else(|| {
                            RepositoryError::configuration(
                                "Postgres repository requires database configuration",
                            )
                        })?
                    };
                    let pg = Self::create_postgres(&pg_config).await?;
                    Ok(pg as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    Err(RepositoryError::configuration(
                        "Postgres repository feature not enabled",
                    ))
                }
            }
            RepositoryType::Local => Ok(Self::create_local_with(&config.local)),
        }
    }
}
