use crate::api::runtime::Environment;
use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::BoolishValueParser};

pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_DEBUG: &str = "debug";
pub const ARG_CORS_ORIGINS: &str = "cors-origins";

pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "https://alumna-connect-platform-xldu.vercel.app",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "https://localhost:5173",
];

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long("environment")
                .help("Deployment environment; production sends cross-site secure cookies")
                .env("ALUMNA_ENV")
                .default_value("production")
                .value_parser(["production", "development"])
                .global(true),
        )
        .arg(
            Arg::new(ARG_DEBUG)
                .long("debug")
                .help("Raise the default log level to DEBUG")
                .env("ALUMNA_DEBUG")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new())
                .global(true),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGINS)
                .long("cors-origins")
                .help("Comma separated list of origins allowed to make credentialed requests")
                .env("ALUMNA_CORS_ORIGINS")
                .value_delimiter(',')
                .default_values(DEFAULT_CORS_ORIGINS),
        )
}

#[derive(Debug)]
pub struct Options {
    pub environment: Environment,
    pub debug: bool,
    pub cors_origins: Vec<String>,
}

impl Options {
    /// # Errors
    /// Returns an error if the environment name is not recognised.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let name = matches
            .get_one::<String>(ARG_ENVIRONMENT)
            .map_or("production", String::as_str);
        let environment =
            Environment::parse(name).ok_or_else(|| anyhow!("invalid --environment: {name}"))?;

        let cors_origins = matches
            .get_many::<String>(ARG_CORS_ORIGINS)
            .map(|values| {
                values
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment,
            debug: matches.get_flag(ARG_DEBUG),
            cors_origins,
        })
    }
}
