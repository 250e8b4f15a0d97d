//! Product catalog seeding.
//!
//! Reads a YAML product list and upserts each entry, so re-running the
//! command against an updated file refreshes prices in place. With
//! `--prune`, products missing from the file are deleted afterwards;
//! carts still referencing them are reconciled on their next load.
//!
//! # File Format
//!
//! ```yaml
//! products:
//!   - id: batido-proteina
//!     name: Batido de proteina
//!     price: "25000"
//!     description: Batido post-entreno
//!     image_url: https://cdn.comelonesfit.com/batido.jpg
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use comelones_core::ProductId;
use comelones_storefront::db::ProductRepository;
use comelones_storefront::models::Product;

use super::{CliError, database_url};

#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    id: ProductId,
    name: String,
    price: Decimal,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

/// Upsert products from a YAML file, optionally pruning rows the file
/// no longer lists.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or a write fails.
pub async fn products(file: &Path, prune: bool) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(file)?;
    let seed: SeedFile = serde_yaml::from_str(&raw)?;

    let url = database_url()?;
    let pool = PgPool::connect(&url).await?;
    let repo = ProductRepository::new(&pool);

    let count = seed.products.len();
    let now = Utc::now();
    let mut seeded = HashSet::with_capacity(count);

    for entry in seed.products {
        tracing::info!(product_id = %entry.id, "seeding product");
        seeded.insert(entry.id.clone());
        repo.upsert(&Product {
            id: entry.id,
            name: entry.name,
            price: entry.price,
            description: entry.description,
            image_url: entry.image_url,
            created_at: now,
        })
        .await?;
    }

    tracing::info!("Seeded {count} products");

    if prune {
        let existing = repo.list_ids().await?;
        for id in stale_ids(existing, &seeded) {
            tracing::info!(product_id = %id, "pruning product absent from seed file");
            repo.delete(&id).await?;
        }
    }

    Ok(())
}

/// IDs present in the database but absent from the seed file.
fn stale_ids(existing: Vec<ProductId>, keep: &HashSet<ProductId>) -> Vec<ProductId> {
    existing.into_iter().filter(|id| !keep.contains(id)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_ids_keeps_only_unseeded_rows() {
        let existing = vec![
            ProductId::new("batido"),
            ProductId::new("retirado"),
            ProductId::new("bowl"),
        ];
        let keep: HashSet<ProductId> = [ProductId::new("batido"), ProductId::new("bowl")]
            .into_iter()
            .collect();

        assert_eq!(stale_ids(existing, &keep), vec![ProductId::new("retirado")]);
    }
}
