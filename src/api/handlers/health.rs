//! Unauthenticated diagnostics used by the hosting platform.

use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span};
use utoipa::ToSchema;

use crate::{
    GIT_COMMIT_HASH,
    api::{error::ApiError, runtime::RuntimeInfo},
    db::{Bootstrap, ping, schema::create_schema},
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    status: String,
    service: String,
    database_configured: bool,
    database_initialized: bool,
    version: String,
    commit: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up; database flags reflect start-up bootstrap", body = Health)
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(method: Method, bootstrap: Extension<Arc<Bootstrap>>) -> impl IntoResponse {
    let health = Health {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        database_configured: bootstrap.database_configured(),
        database_initialized: bootstrap.database_initialized(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: GIT_COMMIT_HASH.to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.service, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    (StatusCode::OK, headers, body)
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EnvironmentInfo {
    environment: String,
    debug: bool,
    secret_key_set: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DebugDb {
    backend: String,
    database_configured: bool,
    database_initialized: bool,
    postgres_url_exists: bool,
    init_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_error: Option<String>,
    environment_vars: EnvironmentInfo,
    database_connection_test: String,
}

#[utoipa::path(
    get,
    path = "/debug-db",
    responses((status = 200, description = "Bootstrap flags and a live connection test", body = DebugDb)),
    tag = "health"
)]
pub async fn debug_db(
    pool: Extension<AnyPool>,
    bootstrap: Extension<Arc<Bootstrap>>,
    runtime: Extension<Arc<RuntimeInfo>>,
) -> Json<DebugDb> {
    let database_connection_test = if bootstrap.database_configured() {
        let span = info_span!("db.ping", db.operation = "PING");
        match ping(&pool).instrument(span).await {
            Ok(()) => "SUCCESS".to_string(),
            Err(err) => format!("FAILED: {err:#}"),
        }
    } else {
        "NOT_ATTEMPTED".to_string()
    };

    Json(DebugDb {
        backend: bootstrap.backend().to_string(),
        database_configured: bootstrap.database_configured(),
        database_initialized: bootstrap.database_initialized(),
        postgres_url_exists: bootstrap.postgres_configured(),
        init_policy: bootstrap.policy().as_str().to_string(),
        init_error: bootstrap.init_error().map(str::to_string),
        environment_vars: EnvironmentInfo {
            environment: runtime.environment.to_string(),
            debug: runtime.debug,
            secret_key_set: runtime.secret_key_set,
        },
        database_connection_test,
    })
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct InitDb {
    success: bool,
    message: String,
    database_initialized: bool,
}

/// Re-run table creation. The start-up bootstrap record is left as it was.
#[utoipa::path(
    get,
    path = "/init-db",
    responses(
        (status = 200, description = "Tables created or already present", body = InitDb),
        (status = 500, description = "Schema creation failed")
    ),
    tag = "health"
)]
pub async fn init_db(
    pool: Extension<AnyPool>,
    bootstrap: Extension<Arc<Bootstrap>>,
) -> Result<Response, ApiError> {
    create_schema(&pool, bootstrap.backend())
        .await
        .map_err(|err| ApiError::internal("Database initialization failed", err))?;

    info!(backend = %bootstrap.backend(), "database schema re-initialized on request");

    Ok(Json(InitDb {
        success: true,
        message: "Database initialized successfully".to_string(),
        database_initialized: true,
    })
    .into_response())
}
