use crate::{
    api::{
        self, AppContext,
        handlers::auth::{AuthConfig, AuthState},
        runtime::RuntimeInfo,
    },
    cli::commands::{auth, database, runtime},
    db,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub database: database::Options,
    pub auth: auth::Options,
    pub runtime: runtime::Options,
}

/// Connect the database, run the schema bootstrap, and serve until a
/// shutdown signal arrives.
/// # Errors
/// Returns an error if bootstrap fails under `fail-fast` or the server cannot start.
pub async fn execute(args: Args) -> Result<()> {
    let Args {
        port,
        database,
        auth,
        runtime,
    } = args;

    info!(
        backend = %database.url.backend(),
        url = %database.url.redacted(),
        policy = database.init_policy.as_str(),
        "configuring database"
    );

    let pool = db::connect(&database.url, &database.pool)?;
    let bootstrap = db::initialize(&pool, database.url.backend(), database.init_policy).await?;

    let config = AuthConfig::new(auth.secret_key)
        .with_session_ttl_seconds(auth.session_ttl_seconds)
        .with_session_cookie_secure(runtime.environment.is_production());

    let runtime_info = RuntimeInfo {
        environment: runtime.environment,
        debug: runtime.debug,
        secret_key_set: !config.uses_default_secret(),
    };

    let context = AppContext {
        pool,
        bootstrap: Arc::new(bootstrap),
        auth: Arc::new(AuthState::new(config)),
        runtime: Arc::new(runtime_info),
    };

    api::new(port, context, &runtime.cors_origins).await
}
