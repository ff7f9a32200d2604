use crate::api::handlers::auth::DEFAULT_SECRET_KEY;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long("secret-key")
                .help("Key used to digest session tokens")
                .env("SECRET_KEY")
                .hide_env_values(true)
                .hide_default_value(true)
                .default_value(DEFAULT_SECRET_KEY),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Session lifetime in seconds")
                .env("ALUMNA_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub secret_key: SecretString,
    pub session_ttl_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret_key = matches
            .get_one::<String>(ARG_SECRET_KEY)
            .cloned()
            .context("missing required argument: --secret-key")?;
        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .context("missing required argument: --session-ttl-seconds")?;
        Ok(Self {
            secret_key: SecretString::from(secret_key),
            session_ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults() -> Result<()> {
        temp_env::with_vars(
            [
                ("SECRET_KEY", None::<&str>),
                ("ALUMNA_SESSION_TTL_SECONDS", None),
            ],
            || {
                let matches = with_args(Command::new("test")).try_get_matches_from(vec!["test"])?;
                let options = Options::parse(&matches)?;
                assert_eq!(options.secret_key.expose_secret(), DEFAULT_SECRET_KEY);
                assert_eq!(options.session_ttl_seconds, 86_400);
                Ok(())
            },
        )
    }

    #[test]
    fn secret_from_env() -> Result<()> {
        temp_env::with_vars(
            [
                ("SECRET_KEY", Some("s3cret")),
                ("ALUMNA_SESSION_TTL_SECONDS", Some("60")),
            ],
            || {
                let matches = with_args(Command::new("test")).try_get_matches_from(vec!["test"])?;
                let options = Options::parse(&matches)?;
                assert_eq!(options.secret_key.expose_secret(), "s3cret");
                assert_eq!(options.session_ttl_seconds, 60);
                Ok(())
            },
        )
    }
}
