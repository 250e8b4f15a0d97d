//! Role directory inspection.
//!
//! Roles are configuration, not database state: the owner and admin
//! lists come from environment variables and are resolved per login.
//! This command prints what the current environment would assign.

use comelones_core::Email;
use comelones_core::role::RoleDirectory;

use super::CliError;

/// Print the configured owner and admin role assignments as JSON.
///
/// # Errors
///
/// Returns `CliError` if the role environment variables are missing or
/// contain invalid emails.
#[allow(clippy::print_stdout)]
pub fn audit() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let owner_raw = std::env::var("COMELONES_OWNER_EMAIL")
        .map_err(|_| CliError::MissingEnvVar("COMELONES_OWNER_EMAIL"))?;
    let owner = Email::parse(&owner_raw)
        .map_err(|e| CliError::InvalidEmail("COMELONES_OWNER_EMAIL", e))?;

    let admins = match std::env::var("COMELONES_ADMIN_EMAILS") {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Email::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CliError::InvalidEmail("COMELONES_ADMIN_EMAILS", e))?,
        Err(_) => Vec::new(),
    };

    let directory = RoleDirectory::new(owner, admins);

    let report = serde_json::json!({
        "owner": directory.owner_email(),
        "admins": directory.admin_emails(),
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
