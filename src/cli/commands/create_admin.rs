use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const NAME: &str = "create-admin";

pub const ARG_EMAIL: &str = "email";
pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_FIRST_NAME: &str = "first-name";
pub const ARG_LAST_NAME: &str = "last-name";

#[must_use]
pub fn subcommand() -> Command {
    Command::new(NAME)
        .about("Create the first super admin account and exit")
        .arg(
            Arg::new(ARG_EMAIL)
                .long("email")
                .help("Email address of the super admin")
                .env("ALUMNA_ADMIN_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_USERNAME)
                .long("username")
                .help("Username of the super admin")
                .env("ALUMNA_ADMIN_USERNAME")
                .default_value("super_admin"),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Initial password of the super admin")
                .env("ALUMNA_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_FIRST_NAME)
                .long("first-name")
                .env("ALUMNA_ADMIN_FIRST_NAME")
                .default_value("Super"),
        )
        .arg(
            Arg::new(ARG_LAST_NAME)
                .long("last-name")
                .env("ALUMNA_ADMIN_LAST_NAME")
                .default_value("Admin"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub email: String,
    pub username: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
}

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let get = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .with_context(|| format!("missing required argument: --{id}"))
        };

        Ok(Self {
            email: get(ARG_EMAIL)?,
            username: get(ARG_USERNAME)?,
            password: SecretString::from(get(ARG_PASSWORD)?),
            first_name: get(ARG_FIRST_NAME)?,
            last_name: get(ARG_LAST_NAME)?,
        })
    }
}
