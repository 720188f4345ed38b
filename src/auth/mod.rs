pub mod storage;

pub use storage::{AuthStorage, Credential, KeySource};

use anyhow::{Context, Result, bail};

use crate::consts::{API_KEY_ENV, PROVIDER};

/// Validate and store an API key for the chat-completion provider.
///
/// Shared by the CLI `glance login` subcommand and the `/login` REPL command.
pub fn login(db_path: &str, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        bail!("no API key provided");
    }
    if key.chars().any(char::is_whitespace) {
        bail!("API key must not contain whitespace");
    }
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .set(PROVIDER, Credential::api_key(key))
        .context("failed to save credentials")?;
    Ok(())
}

/// Remove the stored API key.
pub fn logout(db_path: &str) -> Result<()> {
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .remove(PROVIDER)
        .context("failed to remove credentials")?;
    Ok(())
}

/// Status label for display, e.g. `"API key ✓"`.
pub fn status(db_path: &str) -> String {
    AuthStorage::open(db_path)
        .and_then(|s| s.key_source(PROVIDER, API_KEY_ENV))
        .map(|source| source.label().to_string())
        .unwrap_or_else(|e| format!("unavailable ({e})"))
}
