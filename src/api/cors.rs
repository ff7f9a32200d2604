//! Exact-origin CORS.
//!
//! `CorsLayer` answers allow-listed origins. `reject_foreign_origins` sits in
//! front of it: a preflight from any other origin is a bare 404, and every
//! other response to such an origin loses its `access-control-*` headers.

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
        header::{ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{sync::Arc, time::Duration};
use tower_http::cors::{AllowCredentials, AllowOrigin, CorsLayer};
use tracing::debug;
use url::Url;

const CORS_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct CorsPolicy {
    origins: Arc<[HeaderValue]>,
}

impl CorsPolicy {
    /// # Errors
    /// Returns an error if an origin is not a valid `scheme://host[:port]` URL.
    pub fn new(origins: &[String]) -> Result<Self> {
        let origins = origins
            .iter()
            .map(|origin| origin_header(origin))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            origins: origins.into(),
        })
    }

    #[must_use]
    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    /// The tower-http layer for allow-listed origins.
    #[must_use]
    pub fn layer(&self) -> CorsLayer {
        let credentials = self.clone();

        CorsLayer::new()
            .allow_headers([
                CONTENT_TYPE,
                AUTHORIZATION,
                HeaderName::from_static("x-requested-with"),
            ])
            .allow_methods([
                Method::GET,
                Method::PUT,
                Method::POST,
                Method::DELETE,
                Method::OPTIONS,
                Method::PATCH,
            ])
            .allow_origin(AllowOrigin::list(self.origins.iter().cloned()))
            .allow_credentials(AllowCredentials::predicate(move |origin, _parts| {
                credentials.allows(origin)
            }))
            .max_age(Duration::from_secs(CORS_MAX_AGE_SECONDS))
    }
}

/// Middleware: keep CORS headers away from origins that are not allow-listed.
pub async fn reject_foreign_origins(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = request
        .headers()
        .get(ORIGIN)
        .is_some_and(|origin| policy.allows(origin));

    if !allowed && is_preflight(&request) {
        debug!(
            origin = ?request.headers().get(ORIGIN),
            "preflight from origin outside the allow-list"
        );
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut response = next.run(request).await;
    if !allowed {
        strip_cors_headers(response.headers_mut());
    }
    response
}

fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

fn strip_cors_headers(headers: &mut HeaderMap) {
    let names: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("access-control-"))
        .cloned()
        .collect();
    for name in names {
        headers.remove(name);
    }
}

fn origin_header(origin: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(origin.trim()).with_context(|| format!("Invalid CORS origin: {origin}"))?;
    let host = parsed
        .host_str()
        .with_context(|| format!("CORS origin must include a host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build CORS origin header")
}
