//! Database URL resolution, pool construction and schema bootstrap.
//!
//! Postgres is used when an external URL is configured; otherwise the service
//! falls back to a local SQLite file. Both run through the `sqlx` `Any` driver,
//! so queries stick to portable SQL: `$n` placeholders, `TEXT` timestamps and
//! `BIGINT` ids.

pub mod schema;

pub use schema::{Bootstrap, InitPolicy, initialize, ping};

use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{AnyPool, any::AnyPoolOptions};
use std::{fmt, time::Duration};
use url::Url;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_LIFETIME_SECONDS: u64 = 1800;
const DEFAULT_ACQUIRE_TIMEOUT_SECONDS: u64 = 20;
const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connection string tagged with the backend it points at.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseUrl {
    backend: Backend,
    url: String,
}

impl DatabaseUrl {
    /// Pick the external Postgres URL when present, else the local SQLite file.
    ///
    /// Hosting platforms hand out `postgres://` URLs; they are rewritten to the
    /// `postgresql://` scheme before use.
    ///
    /// # Errors
    /// Returns an error if the URL uses an unsupported scheme.
    pub fn resolve(dsn: Option<&str>, sqlite_path: &str) -> Result<Self> {
        let dsn = dsn.map(str::trim).filter(|value| !value.is_empty());

        let Some(dsn) = dsn else {
            let path = sqlite_path.trim();
            if path.is_empty() {
                return Err(anyhow!("SQLite path must not be empty"));
            }
            return Ok(Self {
                backend: Backend::Sqlite,
                url: format!("sqlite://{path}?mode=rwc"),
            });
        };

        if let Some(rest) = dsn.strip_prefix("postgres://") {
            Ok(Self {
                backend: Backend::Postgres,
                url: format!("postgresql://{rest}"),
            })
        } else if dsn.starts_with("postgresql://") {
            Ok(Self {
                backend: Backend::Postgres,
                url: dsn.to_string(),
            })
        } else if dsn.starts_with("sqlite:") {
            Ok(Self {
                backend: Backend::Sqlite,
                url: dsn.to_string(),
            })
        } else {
            let scheme = dsn.split(':').next().unwrap_or_default();
            Err(anyhow!("Unsupported database URL scheme: {scheme}"))
        }
    }

    /// Private in-memory SQLite database, used by tests and local experiments.
    #[must_use]
    pub fn sqlite_memory() -> Self {
        Self {
            backend: Backend::Sqlite,
            url: SQLITE_MEMORY_URL.to_string(),
        }
    }

    #[must_use]
    pub const fn backend(&self) -> Backend {
        self.backend
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Every connection to an in-memory SQLite URL opens a fresh database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.backend == Backend::Sqlite
            && (self.url.contains(":memory:") || self.url.contains("mode=memory"))
    }

    /// URL with the password masked, safe for logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut parsed) if parsed.password().is_some() => {
                if parsed.set_password(Some("***")).is_ok() {
                    parsed.to_string()
                } else {
                    self.url.clone()
                }
            }
            _ => self.url.clone(),
        }
    }
}

impl fmt::Debug for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseUrl")
            .field("backend", &self.backend)
            .field("url", &self.redacted())
            .finish()
    }
}

/// Connection pool sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_lifetime: Duration::from_secs(DEFAULT_MAX_LIFETIME_SECONDS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECONDS),
        }
    }
}

/// Build a lazily connecting pool. Connections are health-checked before use.
///
/// # Errors
/// Returns an error if the URL cannot be parsed into connect options.
pub fn connect(url: &DatabaseUrl, settings: &PoolSettings) -> Result<AnyPool> {
    sqlx::any::install_default_drivers();

    let mut options = AnyPoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .max_lifetime(settings.max_lifetime)
        .acquire_timeout(settings.acquire_timeout)
        .test_before_acquire(true);

    if url.is_in_memory() {
        // Keep the single connection alive for the life of the pool.
        options = options
            .min_connections(1)
            .max_connections(1)
            .max_lifetime(None)
            .idle_timeout(None);
    }

    options
        .connect_lazy(url.as_str())
        .with_context(|| format!("Invalid database URL: {}", url.redacted()))
}

/// Current UTC time as an RFC 3339 string, the storage format for timestamps.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `true` when a database error is a unique-constraint violation.
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_normalizes_postgres_scheme() -> Result<()> {
        let url = DatabaseUrl::resolve(Some("postgres://u:p@db:5432/alumni"), "alumni.db")?;
        assert_eq!(url.backend(), Backend::Postgres);
        assert_eq!(url.as_str(), "postgresql://u:p@db:5432/alumni");
        Ok(())
    }

    #[test]
    fn resolve_keeps_postgresql_scheme() -> Result<()> {
        let url = DatabaseUrl::resolve(Some("postgresql://db/alumni"), "alumni.db")?;
        assert_eq!(url.as_str(), "postgresql://db/alumni");
        Ok(())
    }

    #[test]
    fn resolve_falls_back_to_sqlite_file() -> Result<()> {
        let url = DatabaseUrl::resolve(None, "/var/lib/alumna/alumni.db")?;
        assert_eq!(url.backend(), Backend::Sqlite);
        assert_eq!(url.as_str(), "sqlite:///var/lib/alumna/alumni.db?mode=rwc");
        assert!(!url.is_in_memory());

        let blank = DatabaseUrl::resolve(Some("   "), "alumni.db")?;
        assert_eq!(blank.backend(), Backend::Sqlite);
        Ok(())
    }

    #[test]
    fn resolve_rejects_unknown_scheme() {
        let err = DatabaseUrl::resolve(Some("mysql://db/alumni"), "alumni.db");
        assert!(err.is_err());
    }

    #[test]
    fn sqlite_memory_is_in_memory() {
        assert!(DatabaseUrl::sqlite_memory().is_in_memory());
    }

    #[test]
    fn redacted_masks_password() -> Result<()> {
        let url = DatabaseUrl::resolve(Some("postgres://user:secret@db/alumni"), "alumni.db")?;
        let redacted = url.redacted();
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("user:***@db"));
        assert!(!format!("{url:?}").contains("secret"));
        Ok(())
    }

    #[test]
    fn now_rfc3339_is_utc() {
        assert!(now_rfc3339().ends_with('Z'));
    }
}
