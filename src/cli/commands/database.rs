use crate::db::{DatabaseUrl, InitPolicy, PoolSettings};
use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_DSN: &str = "dsn";
pub const ARG_SQLITE_PATH: &str = "sqlite-path";
pub const ARG_DB_INIT_POLICY: &str = "db-init-policy";
pub const ARG_DB_MAX_CONNECTIONS: &str = "db-max-connections";
pub const ARG_DB_MAX_LIFETIME_SECONDS: &str = "db-max-lifetime-seconds";
pub const ARG_DB_ACQUIRE_TIMEOUT_SECONDS: &str = "db-acquire-timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("External Postgres connection string")
                .long_help(
                    "External Postgres connection string. A postgres:// prefix is rewritten to postgresql://. When absent, a local SQLite file is used.",
                )
                .env("POSTGRES_URL")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SQLITE_PATH)
                .long("sqlite-path")
                .help("SQLite database file used when no --dsn is given")
                .env("ALUMNA_SQLITE_PATH")
                .default_value("alumni.db")
                .global(true),
        )
        .arg(
            Arg::new(ARG_DB_INIT_POLICY)
                .long("db-init-policy")
                .help("What to do when schema creation fails at start-up")
                .env("ALUMNA_DB_INIT_POLICY")
                .default_value("fail-fast")
                .value_parser(["fail-fast", "fail-open"])
                .global(true),
        )
        .arg(
            Arg::new(ARG_DB_MAX_CONNECTIONS)
                .long("db-max-connections")
                .help("Maximum pool size")
                .env("ALUMNA_DB_MAX_CONNECTIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..))
                .global(true),
        )
        .arg(
            Arg::new(ARG_DB_MAX_LIFETIME_SECONDS)
                .long("db-max-lifetime-seconds")
                .help("Recycle pooled connections after this many seconds")
                .env("ALUMNA_DB_MAX_LIFETIME_SECONDS")
                .default_value("1800")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new(ARG_DB_ACQUIRE_TIMEOUT_SECONDS)
                .long("db-acquire-timeout-seconds")
                .help("Give up waiting for a pooled connection after this many seconds")
                .env("ALUMNA_DB_ACQUIRE_TIMEOUT_SECONDS")
                .default_value("20")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: DatabaseUrl,
    pub init_policy: InitPolicy,
    pub pool: PoolSettings,
}

impl Options {
    /// # Errors
    /// Returns an error if the connection string has an unsupported scheme.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let dsn = matches
            .get_one::<String>(ARG_DSN)
            .map(String::as_str)
            .filter(|dsn| !dsn.trim().is_empty());
        let sqlite_path = matches
            .get_one::<String>(ARG_SQLITE_PATH)
            .context("missing required argument: --sqlite-path")?;
        let url = DatabaseUrl::resolve(dsn, sqlite_path)?;

        let policy = matches
            .get_one::<String>(ARG_DB_INIT_POLICY)
            .map_or("fail-fast", String::as_str);
        let init_policy = InitPolicy::parse(policy)
            .ok_or_else(|| anyhow!("invalid --db-init-policy: {policy}"))?;

        let defaults = PoolSettings::default();
        let pool = PoolSettings {
            max_connections: matches
                .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
                .copied()
                .unwrap_or(defaults.max_connections),
            max_lifetime: matches
                .get_one::<u64>(ARG_DB_MAX_LIFETIME_SECONDS)
                .map_or(defaults.max_lifetime, |secs| Duration::from_secs(*secs)),
            acquire_timeout: matches
                .get_one::<u64>(ARG_DB_ACQUIRE_TIMEOUT_SECONDS)
                .map_or(defaults.acquire_timeout, |secs| Duration::from_secs(*secs)),
        };

        Ok(Self {
            url,
            init_policy,
            pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Backend;

    fn cleared<F: FnOnce() -> R, R>(f: F) -> R {
        temp_env::with_vars(
            [
                ("POSTGRES_URL", None::<&str>),
                ("ALUMNA_SQLITE_PATH", None),
                ("ALUMNA_DB_INIT_POLICY", None),
                ("ALUMNA_DB_MAX_CONNECTIONS", None),
                ("ALUMNA_DB_MAX_LIFETIME_SECONDS", None),
                ("ALUMNA_DB_ACQUIRE_TIMEOUT_SECONDS", None),
            ],
            f,
        )
    }

    #[test]
    fn defaults_to_sqlite_file() -> Result<()> {
        cleared(|| {
            let matches = with_args(Command::new("test")).try_get_matches_from(vec!["test"])?;
            let options = Options::parse(&matches)?;
            assert_eq!(options.url.backend(), Backend::Sqlite);
            assert!(options.url.as_str().contains("alumni.db"));
            assert_eq!(options.init_policy, InitPolicy::FailFast);
            assert_eq!(options.pool.max_connections, 5);
            assert_eq!(options.pool.max_lifetime, Duration::from_secs(1800));
            assert_eq!(options.pool.acquire_timeout, Duration::from_secs(20));
            Ok(())
        })
    }

    #[test]
    fn postgres_url_from_env() -> Result<()> {
        temp_env::with_vars(
            [
                ("POSTGRES_URL", Some("postgres://app:pw@db:5432/alumni")),
                ("ALUMNA_DB_INIT_POLICY", Some("fail-open")),
                ("ALUMNA_DB_MAX_CONNECTIONS", Some("12")),
            ],
            || {
                let matches = with_args(Command::new("test")).try_get_matches_from(vec!["test"])?;
                let options = Options::parse(&matches)?;
                assert_eq!(options.url.backend(), Backend::Postgres);
                assert!(options.url.as_str().starts_with("postgresql://"));
                assert_eq!(options.init_policy, InitPolicy::FailOpen);
                assert_eq!(options.pool.max_connections, 12);
                Ok(())
            },
        )
    }

    #[test]
    fn rejects_unknown_policy_and_zero_pool() {
        cleared(|| {
            let command = with_args(Command::new("test"));
            assert!(
                command
                    .clone()
                    .try_get_matches_from(vec!["test", "--db-init-policy", "retry"])
                    .is_err()
            );
            assert!(
                command
                    .try_get_matches_from(vec!["test", "--db-max-connections", "0"])
                    .is_err()
            );
        });
    }
}
