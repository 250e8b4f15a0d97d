//! Session establishment and teardown.
//!
//! Authentication itself happens at the identity provider; the client
//! posts the verified profile here. The handler resolves the user's
//! role from the configured directory, records the login, merges the
//! guest cart with the persisted one, and stores the identity in the
//! session.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use comelones_core::{Email, UserId};
use comelones_core::cart::Cart;

use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::CartView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: CurrentUser,
    pub cart: Cart,
    pub sync_error: Option<String>,
}

/// `POST /auth/session` - establish a session for a verified profile.
#[instrument(skip_all, fields(user_id = %body.user_id))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::BadRequest(format!("invalid email: {e}")))?;

    // The role directory is authoritative on every login, so a user
    // promoted to admin (or demoted) heals on their next session
    let role = state.roles().resolve(&email);

    UserRepository::new(state.pool())
        .upsert_on_login(&body.user_id, &email, role, Utc::now())
        .await?;

    let user = CurrentUser {
        id: body.user_id,
        email,
        role,
    };

    // Rotate the session ID before attaching the identity
    session.cycle_id().await?;
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    let CartView { cart, sync_error } = state.cart_sync().sync_on_login(&session, &user).await?;

    info!(user_id = %user.id, role = %user.role, "session established");
    Ok(Json(LoginResponse {
        user,
        cart,
        sync_error,
    }))
}

/// `DELETE /auth/session` - logout.
///
/// Clears the identity and resets the session cart. The persisted cart
/// is untouched and will be merged back at the next login.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    clear_current_user(&session).await?;
    state.cart_sync().reset(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();

    Ok(Json(CartView {
        cart: Cart::empty(None),
        sync_error: None,
    }))
}
