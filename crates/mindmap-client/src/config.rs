//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration against a local SQLite file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mindmap_shared::constants::SESSION_TTL_HOURS;
use mindmap_store::{Database, RestTable, StoreError, TableStore};

/// Where the `mindmaps` collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Local SQLite file. `None` uses the platform data directory.
    Sqlite { path: Option<PathBuf> },
    /// Hosted PostgREST endpoint.
    Rest { url: String, api_key: String },
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Env: `MINDMAP_BACKEND` (`sqlite` | `rest`)
    /// Default: `sqlite`
    pub backend: Backend,

    /// Directory holding the persisted session slot.
    /// Env: `MINDMAP_DATA_DIR`
    /// Default: platform data directory.
    pub data_dir: Option<PathBuf>,

    /// How long a cached passphrase is reused across restarts.
    /// Env: `MINDMAP_SESSION_TTL_HOURS`
    /// Default: `24`
    pub session_ttl: chrono::Duration,

    /// Per-request timeout for the REST backend.
    /// Env: `MINDMAP_HTTP_TIMEOUT_SECS`
    /// Default: `30`
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite { path: None },
            data_dir: None,
            session_ttl: chrono::Duration::hours(SESSION_TTL_HOURS),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let db_path = var("MINDMAP_DB_PATH").map(PathBuf::from);
        config.backend = Backend::Sqlite { path: db_path };

        match var("MINDMAP_BACKEND").as_deref() {
            None | Some("sqlite") => {}
            Some("rest") => match (var("MINDMAP_REST_URL"), var("MINDMAP_API_KEY")) {
                (Some(url), Some(api_key)) if !url.is_empty() => {
                    config.backend = Backend::Rest { url, api_key };
                }
                _ => {
                    tracing::warn!(
                        "MINDMAP_BACKEND=rest needs MINDMAP_REST_URL and MINDMAP_API_KEY, using sqlite"
                    );
                }
            },
            Some(other) => {
                tracing::warn!(value = %other, "Invalid MINDMAP_BACKEND, using sqlite");
            }
        }

        if let Some(dir) = var("MINDMAP_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(val) = var("MINDMAP_SESSION_TTL_HOURS") {
            match val.parse::<i64>() {
                Ok(hours) if hours > 0 => config.session_ttl = chrono::Duration::hours(hours),
                _ => tracing::warn!(value = %val, "Invalid MINDMAP_SESSION_TTL_HOURS, using default"),
            }
        }

        if let Some(val) = var("MINDMAP_HTTP_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid MINDMAP_HTTP_TIMEOUT_SECS, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Open the table adapter selected by [`ClientConfig::backend`].
    pub fn open_table(&self) -> Result<Arc<dyn TableStore>, StoreError> {
        let table: Arc<dyn TableStore> = match &self.backend {
            Backend::Sqlite { path: Some(path) } => Arc::new(Database::open_at(path)?),
            Backend::Sqlite { path: None } => Arc::new(Database::new()?),
            Backend::Rest { url, api_key } => {
                Arc::new(RestTable::new(url, api_key.clone(), self.http_timeout)?)
            }
        };
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);
        assert_eq!(config.backend, Backend::Sqlite { path: None });
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_rest_backend() {
        let config = config_from(&[
            ("MINDMAP_BACKEND", "rest"),
            ("MINDMAP_REST_URL", "https://x.supabase.co"),
            ("MINDMAP_API_KEY", "anon"),
        ]);
        assert_eq!(
            config.backend,
            Backend::Rest {
                url: "https://x.supabase.co".into(),
                api_key: "anon".into()
            }
        );
    }

    #[test]
    fn test_incomplete_rest_falls_back_to_sqlite() {
        let config = config_from(&[("MINDMAP_BACKEND", "rest"), ("MINDMAP_DB_PATH", "/tmp/m.db")]);
        assert_eq!(
            config.backend,
            Backend::Sqlite {
                path: Some(PathBuf::from("/tmp/m.db"))
            }
        );
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let config = config_from(&[
            ("MINDMAP_SESSION_TTL_HOURS", "forever"),
            ("MINDMAP_HTTP_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_open_sqlite_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_from(&[("MINDMAP_DB_PATH", dir.path().join("m.db").to_str().unwrap())]);
        assert!(config.open_table().is_ok());
    }
}
