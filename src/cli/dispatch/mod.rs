use crate::cli::{
    actions::{Action, create_admin, server},
    commands::{self, auth, database, runtime},
};
use anyhow::Result;
use clap::ArgMatches;

/// Turn parsed arguments into the action to run. Without a subcommand the
/// server is started.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    if let Some(sub) = matches.subcommand_matches(commands::create_admin::NAME) {
        return Ok(Action::CreateAdmin(create_admin::Args {
            database: database::Options::parse(sub)?,
            admin: commands::create_admin::Options::parse(sub)?,
        }));
    }

    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);

    Ok(Action::Server(server::Args {
        port,
        database: database::Options::parse(matches)?,
        auth: auth::Options::parse(matches)?,
        runtime: runtime::Options::parse(matches)?,
    }))
}
