//! Bootstrap admin account from environment variables.
//!
//! On first start the store has no admin users, so nobody could link a Discord
//! account. When `BOOTSTRAP_ADMIN_USERNAME`, `BOOTSTRAP_ADMIN_EMAIL` and
//! `BOOTSTRAP_ADMIN_PASSWORD` are set, a SuperAdmin account is created from them.
//! `BOOTSTRAP_ADMIN_DISCORD_ID` optionally links it straight away.

/// Credentials for the first SuperAdmin account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Plain-text password, hashed before it is stored
    pub password: String,
    /// Discord user ID to link immediately
    pub discord_id: Option<String>,
}

/// Reads the bootstrap admin from the process environment.
#[must_use]
pub fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    bootstrap_admin_from(|key| std::env::var(key).ok())
}

/// Builds the bootstrap admin from any key lookup. All three required keys must be
/// present and non-empty.
pub fn bootstrap_admin_from<F>(lookup: F) -> Option<BootstrapAdmin>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    Some(BootstrapAdmin {
        username: non_empty("BOOTSTRAP_ADMIN_USERNAME")?,
        email: non_empty("BOOTSTRAP_ADMIN_EMAIL")?,
        password: non_empty("BOOTSTRAP_ADMIN_PASSWORD")?,
        discord_id: non_empty("BOOTSTRAP_ADMIN_DISCORD_ID"),
    })
}
