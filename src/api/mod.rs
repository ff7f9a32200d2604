use crate::db::Bootstrap;
use anyhow::{Context, Result};
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, options},
};
use sqlx::AnyPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span, warn};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

mod cors;
pub mod error;
pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;
pub mod runtime;

pub use cors::CorsPolicy;
pub use openapi::openapi;

use handlers::{auth::AuthState, health, root};
use runtime::RuntimeInfo;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Everything a request handler may read, built once at start-up.
#[derive(Clone)]
pub struct AppContext {
    pub pool: AnyPool,
    pub bootstrap: Arc<Bootstrap>,
    pub auth: Arc<AuthState>,
    pub runtime: Arc<RuntimeInfo>,
}

/// Assemble the HTTP application: documented routes, diagnostics, CORS,
/// request ids and tracing.
#[must_use]
pub fn app(context: AppContext, cors: &CorsPolicy) -> Router {
    // Build the router from OpenAPI-wired routes, then extend it with non-doc routes like `/`,
    // preflight-only `OPTIONS /health`, and the OpenAPI document.
    let (router, spec) = router().split_for_parts();
    let spec = Arc::new(spec);

    router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let spec = Arc::clone(&spec);
                async move { Json(spec.as_ref().clone()) }
            }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(middleware::from_fn_with_state(
                    cors.clone(),
                    cors::reject_foreign_origins,
                ))
                .layer(cors.layer())
                .layer(Extension(context.auth))
                .layer(Extension(context.bootstrap))
                .layer(Extension(context.runtime))
                .layer(Extension(context.pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, context: AppContext, cors_origins: &[String]) -> Result<()> {
    if context.runtime.environment.is_production() && context.auth.config().uses_default_secret() {
        warn!("SECRET_KEY is not set; using the development key in production");
    }

    let cors = CorsPolicy::new(cors_origins)?;
    let app = app(context, &cors);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gracefully shutdown");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
