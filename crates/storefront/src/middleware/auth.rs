//! Authentication extractors and the permission gate.
//!
//! The identity provider authenticates users; the storefront only
//! stores the verified profile in the session and enforces the role
//! policy from `comelones_core::role` on each protected handler.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use tower_sessions::Session;

use comelones_core::role::{Action, UserRole, can};

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires an authenticated user.
///
/// Rejects with `401 Unauthorized` when no user is in the session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The session is placed in extensions by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("no session".to_string()))?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized("login required".to_string()))?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request when nobody
/// is logged in. Guests resolve to `None` and act under
/// `UserRole::Guest`.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Check that `role` is allowed to perform `action`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the policy denies the action.
pub fn ensure(role: UserRole, action: Action) -> Result<(), AppError> {
    if can(role, action) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role {role} may not perform this action"
        )))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(session_keys::CURRENT_USER).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_allows_visitor_checkout() {
        assert!(ensure(UserRole::Visitor, Action::Checkout).is_ok());
    }

    #[test]
    fn test_ensure_denies_guest_checkout() {
        assert!(matches!(
            ensure(UserRole::Guest, Action::Checkout),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_ensure_denies_visitor_admin_actions() {
        assert!(matches!(
            ensure(UserRole::Visitor, Action::ReviewReceipts),
            Err(AppError::Forbidden(_))
        ));
    }
}
