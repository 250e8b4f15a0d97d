//! User roles and the capability policy.
//!
//! Role checks used to be scattered ad hoc across the UI; here they are a
//! single pure function [`can`] over an enumerated [`Action`] set, plus a
//! [`RoleDirectory`] that resolves emails to roles. The directory is an
//! explicit configuration object injected at startup so tests can
//! substitute arbitrary owner/admin sets.

use serde::{Deserialize, Serialize};

use crate::types::Email;

/// Role attached to an identity.
///
/// Exactly one owner email exists system-wide; that identity's role is
/// authoritative and reasserted on every login (self-healing). `Guest` is
/// the role of an unauthenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Owner,
    Admin,
    Visitor,
    Guest,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::Visitor => write!(f, "visitor"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "visitor" => Ok(Self::Visitor),
            "guest" => Ok(Self::Guest),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Everything a role can be asked permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Browse the product catalog.
    ViewCatalog,
    /// Mutate one's own cart.
    EditOwnCart,
    /// Create an order at checkout.
    Checkout,
    /// Review uploaded bank-transfer receipts.
    ReviewReceipts,
    /// Force an order status outside the normal lifecycle.
    OverrideOrderStatus,
    /// Delete orders.
    DeleteOrders,
    /// List and filter all orders, not just one's own.
    ListAllOrders,
    /// Edit the admin membership list.
    ManageRoles,
}

/// Whether `role` is permitted to perform `action`.
///
/// Pure and total: every `(role, action)` pair has an answer, independent
/// of any UI or transport concern.
#[must_use]
pub const fn can(role: UserRole, action: Action) -> bool {
    match action {
        Action::ViewCatalog | Action::EditOwnCart => true,
        Action::Checkout => matches!(role, UserRole::Owner | UserRole::Admin | UserRole::Visitor),
        Action::ReviewReceipts
        | Action::OverrideOrderStatus
        | Action::DeleteOrders
        | Action::ListAllOrders => matches!(role, UserRole::Owner | UserRole::Admin),
        Action::ManageRoles => matches!(role, UserRole::Owner),
    }
}

/// The configured owner and admin identities.
///
/// Injected at startup; never a hardcoded module constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDirectory {
    owner_email: Email,
    admin_emails: Vec<Email>,
}

impl RoleDirectory {
    /// Build a directory from the configured owner and admin emails.
    ///
    /// The owner email is removed from the admin list if present; the
    /// owner role always takes precedence.
    #[must_use]
    pub fn new(owner_email: Email, mut admin_emails: Vec<Email>) -> Self {
        admin_emails.retain(|e| *e != owner_email);
        Self {
            owner_email,
            admin_emails,
        }
    }

    /// The single designated owner identity.
    #[must_use]
    pub const fn owner_email(&self) -> &Email {
        &self.owner_email
    }

    /// The configured admin identities, excluding the owner.
    #[must_use]
    pub fn admin_emails(&self) -> &[Email] {
        &self.admin_emails
    }

    /// Resolve an authenticated email to its authoritative role.
    ///
    /// Callers reassert the result on the stored user record at every
    /// login, which keeps the owner role self-healing even if the record
    /// was edited out of band.
    #[must_use]
    pub fn resolve(&self, email: &Email) -> UserRole {
        if *email == self.owner_email {
            UserRole::Owner
        } else if self.admin_emails.contains(email) {
            UserRole::Admin
        } else {
            UserRole::Visitor
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn directory() -> RoleDirectory {
        RoleDirectory::new(
            Email::parse("owner@comelonesfit.com").unwrap(),
            vec![
                Email::parse("admin1@comelonesfit.com").unwrap(),
                Email::parse("admin2@comelonesfit.com").unwrap(),
            ],
        )
    }

    #[test]
    fn test_resolve_owner() {
        let dir = directory();
        let email = Email::parse("owner@comelonesfit.com").unwrap();
        assert_eq!(dir.resolve(&email), UserRole::Owner);
    }

    #[test]
    fn test_resolve_admin() {
        let dir = directory();
        let email = Email::parse("admin2@comelonesfit.com").unwrap();
        assert_eq!(dir.resolve(&email), UserRole::Admin);
    }

    #[test]
    fn test_resolve_everyone_else_is_visitor() {
        let dir = directory();
        let email = Email::parse("cliente@example.com").unwrap();
        assert_eq!(dir.resolve(&email), UserRole::Visitor);
    }

    #[test]
    fn test_owner_wins_over_admin_listing() {
        let owner = Email::parse("owner@comelonesfit.com").unwrap();
        let dir = RoleDirectory::new(owner.clone(), vec![owner.clone()]);
        assert_eq!(dir.resolve(&owner), UserRole::Owner);
        assert!(dir.admin_emails().is_empty());
    }

    #[test]
    fn test_guests_can_browse_and_edit_cart_only() {
        assert!(can(UserRole::Guest, Action::ViewCatalog));
        assert!(can(UserRole::Guest, Action::EditOwnCart));
        assert!(!can(UserRole::Guest, Action::Checkout));
        assert!(!can(UserRole::Guest, Action::OverrideOrderStatus));
    }

    #[test]
    fn test_visitors_can_checkout_but_not_administer() {
        assert!(can(UserRole::Visitor, Action::Checkout));
        assert!(!can(UserRole::Visitor, Action::ReviewReceipts));
        assert!(!can(UserRole::Visitor, Action::DeleteOrders));
        assert!(!can(UserRole::Visitor, Action::ListAllOrders));
    }

    #[test]
    fn test_admins_can_mutate_orders_but_not_roles() {
        assert!(can(UserRole::Admin, Action::ReviewReceipts));
        assert!(can(UserRole::Admin, Action::OverrideOrderStatus));
        assert!(can(UserRole::Admin, Action::DeleteOrders));
        assert!(!can(UserRole::Admin, Action::ManageRoles));
    }

    #[test]
    fn test_owner_can_do_everything() {
        for action in [
            Action::ViewCatalog,
            Action::EditOwnCart,
            Action::Checkout,
            Action::ReviewReceipts,
            Action::OverrideOrderStatus,
            Action::DeleteOrders,
            Action::ListAllOrders,
            Action::ManageRoles,
        ] {
            assert!(can(UserRole::Owner, action), "owner denied {action:?}");
        }
    }
}
