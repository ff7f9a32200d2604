pub mod auth;
pub mod create_admin;
pub mod database;
pub mod logging;
pub mod runtime;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("alumna")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ALUMNA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .subcommand(create_admin::subcommand());

    let command = database::with_args(command);
    let command = auth::with_args(command);
    let command = runtime::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV: [&str; 8] = [
        "ALUMNA_PORT",
        "POSTGRES_URL",
        "ALUMNA_SQLITE_PATH",
        "ALUMNA_LOG_LEVEL",
        "ALUMNA_ENV",
        "ALUMNA_DEBUG",
        "ALUMNA_ADMIN_EMAIL",
        "ALUMNA_ADMIN_PASSWORD",
    ];

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "alumna");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        command.debug_assert();
    }

    #[test]
    fn test_port_from_env() {
        temp_env::with_vars(
            [
                ("ALUMNA_PORT", Some("443")),
                ("ALUMNA_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().try_get_matches_from(vec!["alumna"]);
                let matches = matches.ok();
                assert_eq!(
                    matches
                        .as_ref()
                        .and_then(|m| m.get_one::<u16>(ARG_PORT).copied()),
                    Some(443)
                );
                assert_eq!(
                    matches.and_then(|m| m.get_one::<u8>(logging::ARG_VERBOSITY).copied()),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_global_args_reach_subcommand() {
        temp_env::with_vars(ENV.map(|key| (key, None::<&str>)), || {
            let matches = new().try_get_matches_from(vec![
                "alumna",
                "--dsn",
                "postgres://user:pw@db:5432/alumna",
                "create-admin",
                "--email",
                "root@alumna.dev",
                "--password",
                "hunter22",
                "-vv",
            ]);
            let Ok(matches) = matches else {
                panic!("arguments should parse");
            };
            let Some(sub) = matches.subcommand_matches(create_admin::NAME) else {
                panic!("create-admin should be selected");
            };
            assert_eq!(
                sub.get_one::<String>(database::ARG_DSN).map(String::as_str),
                Some("postgres://user:pw@db:5432/alumna")
            );
            assert_eq!(
                matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                Some(2)
            );
        });
    }

    #[test]
    fn test_verbosity_count() {
        for count in 0..5u8 {
            temp_env::with_vars(ENV.map(|key| (key, None::<&str>)), || {
                let mut args = vec!["alumna".to_string()];
                if count > 0 {
                    args.push(format!("-{}", "v".repeat(count.into())));
                }
                let matches = new().try_get_matches_from(args).ok();
                assert_eq!(
                    matches.and_then(|m| m.get_one::<u8>(logging::ARG_VERBOSITY).copied()),
                    Some(count)
                );
            });
        }
    }
}
