//! Configuration loading and repository creation.

mod support;

use std::io::Write;
use std::str::FromStr;

use course_schedule::db::{RepositoryConfig, RepositoryFactory, RepositoryType, CONFIG_PATH_ENV};
use course_schedule::models::OfferingId;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_repository_type_from_str_is_case_insensitive() {
    assert_eq!(RepositoryType::from_str("LOCAL").unwrap(), RepositoryType::Local);
    assert_eq!(RepositoryType::from_str("POSTGRES").unwrap(), RepositoryType::Postgres);
    let err = RepositoryType::from_str("sqlite").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/schedule")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_explicit_repository_type_wins() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/schedule")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_load_reads_explicit_path() {
    let file = write_config(
        r#"
[repository]
type = "local"

[scheduling]
default_page_size = 5

[[local.offerings]]
id = 11
teacher_id = 1
credits = 2
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    let config = support::with_scoped_env(&[(CONFIG_PATH_ENV, Some(path.as_str()))], || {
        RepositoryConfig::load().unwrap()
    });
    assert_eq!(config.scheduling.default_page_size, 5);
    assert_eq!(config.local.offerings.len(), 1);
}

#[test]
fn test_load_with_missing_explicit_path_fails() {
    let result = support::with_scoped_env(
        &[(CONFIG_PATH_ENV, Some("/nonexistent/repository.toml"))],
        RepositoryConfig::load,
    );
    assert!(result.is_err());
}

#[test]
fn test_malformed_file_is_configuration_error() {
    let file = write_config("[repository\ntype = ");
    let err = RepositoryConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[tokio::test]
async fn test_factory_seeds_local_repository_from_config() {
    let file = write_config(
        r#"
[repository]
type = "local"

[[local.offerings]]
id = 21
teacher_id = 2
room_id = 3
credits = 4
"#,
    );
    let config = RepositoryConfig::from_file(file.path()).unwrap();
    let repo = RepositoryFactory::from_repository_config(&config).await.unwrap();

    assert!(repo.health_check().await.unwrap());
    let offering = repo.get_offering(OfferingId::new(21)).await.unwrap();
    assert_eq!(offering.credits, Some(4));
}

#[tokio::test]
async fn test_factory_rejects_unknown_type() {
    let file = write_config("[repository]\ntype = \"mongo\"\n");
    let config = RepositoryConfig::from_file(file.path()).unwrap();
    assert!(RepositoryFactory::from_repository_config(&config).await.is_err());
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_postgres_without_feature_is_configuration_error() {
    let file = write_config("[repository]\ntype = \"postgres\"\n");
    let config = RepositoryConfig::from_file(file.path()).unwrap();
    let err = match RepositoryFactory::from_repository_config(&config).await {
        Ok(_) => panic!("postgres must not be available"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("feature not enabled"));
}
