//! CLI command implementations.

pub mod admin;
pub mod metrics;
pub mod migrate;
pub mod seed;

/// Errors shared by the CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid email in {0}: {1}")]
    InvalidEmail(&'static str, comelones_core::EmailError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] comelones_storefront::db::RepositoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read the storefront database URL from the environment.
///
/// Prefers `COMELONES_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<String, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("COMELONES_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingEnvVar("COMELONES_DATABASE_URL"))
}
