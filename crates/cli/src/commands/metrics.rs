//! Order metrics.

use sqlx::PgPool;

use comelones_storefront::db::OrderRepository;

use super::{CliError, database_url};

/// Print order counts and revenue grouped by status, as JSON.
///
/// # Errors
///
/// Returns `CliError` if the connection or the query fails.
#[allow(clippy::print_stdout)]
pub async fn run() -> Result<(), CliError> {
    let url = database_url()?;
    let pool = PgPool::connect(&url).await?;

    let metrics = OrderRepository::new(&pool).status_metrics().await?;

    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
