use axum::{Json, extract::Extension};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use utoipa::ToSchema;

use crate::db::Bootstrap;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Banner {
    pub status: String,
    pub message: String,
    pub service: String,
    pub version: String,
    pub database_configured: bool,
    pub database_initialized: bool,
    pub endpoints: BTreeMap<String, String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TestResponse {
    pub test: String,
    pub success: bool,
}

// axum handler for /
pub async fn root(bootstrap: Extension<Arc<Bootstrap>>) -> Json<Banner> {
    let endpoints = [
        ("health", "/health"),
        ("test", "/test"),
        ("debug", "/debug-db"),
        ("auth", "/api/login"),
        ("super_admin", "/api/super-admin/*"),
        ("openapi", "/api-docs/openapi.json"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect();

    Json(Banner {
        status: "success".to_string(),
        message: "Alumni Management Platform API".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database_configured: bootstrap.database_configured(),
        database_initialized: bootstrap.database_initialized(),
        endpoints,
    })
}

#[utoipa::path(
    get,
    path = "/test",
    responses((status = 200, description = "Liveness probe", body = TestResponse)),
    tag = "health"
)]
pub async fn test() -> Json<TestResponse> {
    Json(TestResponse {
        test: "working".to_string(),
        success: true,
    })
}
