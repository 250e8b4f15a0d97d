//! Product catalog handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::models::Product;
use crate::state::AppState;

/// `GET /products` - the product listing, served from the catalog cache.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().products().await?;
    Ok(Json(products.as_ref().clone()))
}
