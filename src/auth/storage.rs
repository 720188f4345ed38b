use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Credential types stored per provider.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Credential {
    #[serde(rename = "api_key")]
    ApiKey { key: String },
}

impl Credential {
    pub fn api_key(key: impl Into<String>) -> Self {
        Credential::ApiKey { key: key.into() }
    }

    fn secret(&self) -> &str {
        match self {
            Credential::ApiKey { key } => key,
        }
    }
}

/// Where a usable API key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Stored,
    Env,
    Missing,
}

impl KeySource {
    /// Short status label for the banner and `/status`.
    pub fn label(self) -> &'static str {
        match self {
            KeySource::Stored => "API key ✓",
            KeySource::Env => "API key (env) ✓",
            KeySource::Missing => "not authenticated",
        }
    }
}

/// Manages credential storage in SQLite.
pub struct AuthStorage {
    conn: Mutex<Connection>,
}

impl AuthStorage {
    /// Open or create a credentials table in the given database path.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path).context("failed to open credentials database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                provider TEXT PRIMARY KEY,
                data     TEXT NOT NULL
            )",
        )
        .context("failed to create credentials table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get credential for a provider.
    pub fn get(&self, provider: &str) -> Result<Option<Credential>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT data FROM credentials WHERE provider = ?1")?;
        let mut rows = stmt.query([provider])?;
        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                let cred: Credential = serde_json::from_str(&json)
                    .with_context(|| format!("corrupt credential for {provider}"))?;
                Ok(Some(cred))
            }
            None => Ok(None),
        }
    }

    /// Store credential for a provider (upsert).
    pub fn set(&self, provider: &str, credential: Credential) -> Result<()> {
        let json = serde_json::to_string(&credential)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO credentials (provider, data) VALUES (?1, ?2)
             ON CONFLICT(provider) DO UPDATE SET data = excluded.data",
            [provider, &json],
        )?;
        Ok(())
    }

    /// Remove credential for a provider.
    pub fn remove(&self, provider: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM credentials WHERE provider = ?1", [provider])?;
        Ok(())
    }

    /// Get the API key for a provider.
    /// Priority: stored key → environment variable.
    pub fn get_api_key(&self, provider: &str, env_var: &str) -> Result<Option<String>> {
        Ok(self.resolve(provider, env_var)?.map(|(key, _)| key))
    }

    /// Report where the key for `provider` would come from, without returning it.
    pub fn key_source(&self, provider: &str, env_var: &str) -> Result<KeySource> {
        Ok(self
            .resolve(provider, env_var)?
            .map(|(_, source)| source)
            .unwrap_or(KeySource::Missing))
    }

    fn resolve(&self, provider: &str, env_var: &str) -> Result<Option<(String, KeySource)>> {
        if let Some(cred) = self.get(provider)?
            && !cred.secret().is_empty()
        {
            return Ok(Some((cred.secret().to_string(), KeySource::Stored)));
        }

        if let Ok(key) = std::env::var(env_var)
            && !key.trim().is_empty()
        {
            return Ok(Some((key.trim().to_string(), KeySource::Env)));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET_ENV: &str = "GLANCE_TEST_KEY_THAT_IS_NEVER_SET";

    #[test]
    fn stored_key_is_returned() {
        let storage = AuthStorage::open(":memory:").unwrap();
        storage.set("groq", Credential::api_key("gsk-test")).unwrap();

        let key = storage.get_api_key("groq", UNSET_ENV).unwrap();
        assert_eq!(key.as_deref(), Some("gsk-test"));
        assert_eq!(
            storage.key_source("groq", UNSET_ENV).unwrap(),
            KeySource::Stored
        );
    }

    #[test]
    fn missing_key_without_env() {
        let storage = AuthStorage::open(":memory:").unwrap();
        assert!(storage.get_api_key("groq", UNSET_ENV).unwrap().is_none());
        assert_eq!(
            storage.key_source("groq", UNSET_ENV).unwrap(),
            KeySource::Missing
        );
    }

    #[test]
    fn empty_stored_key_is_ignored() {
        let storage = AuthStorage::open(":memory:").unwrap();
        storage.set("groq", Credential::api_key("")).unwrap();
        assert!(storage.get_api_key("groq", UNSET_ENV).unwrap().is_none());
    }

    #[test]
    fn credential_serializes_with_type_tag() {
        let json = serde_json::to_string(&Credential::api_key("k")).unwrap();
        assert_eq!(json, r#"{"type":"api_key","key":"k"}"#);
    }

    #[test]
    fn key_source_labels() {
        assert_eq!(KeySource::Stored.label(), "API key ✓");
        assert_eq!(KeySource::Env.label(), "API key (env) ✓");
        assert_eq!(KeySource::Missing.label(), "not authenticated");
    }
}
