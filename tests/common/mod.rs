#![allow(dead_code)]

use alumna::{
    api::{
        self, AppContext,
        handlers::auth::{
            AdminAccount, AuthConfig, AuthState, PasswordHasher, ProvisionOutcome,
            create_super_admin,
        },
        runtime::{Environment, RuntimeInfo},
    },
    db::{Backend, DatabaseUrl, InitPolicy, PoolSettings, connect, initialize},
};
use anyhow::{Result, bail};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::AnyPool;
use std::sync::Arc;
use tower::ServiceExt;

pub const ROOT_EMAIL: &str = "root@alumna.dev";
pub const ROOT_PASSWORD: &str = "root-password";
pub const USER_PASSWORD: &str = "password123";
pub const ALLOWED_ORIGIN: &str = "https://alumna-connect-platform-xldu.vercel.app";

pub struct TestApp {
    pub router: Router,
    pub pool: AnyPool,
    pub root_id: i64,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string)
    }
}

/// Fresh in-memory database with one super admin and the full router.
pub async fn spawn() -> Result<TestApp> {
    let pool = connect(&DatabaseUrl::sqlite_memory(), &PoolSettings::default())?;
    let bootstrap = initialize(&pool, Backend::Sqlite, InitPolicy::FailFast).await?;

    let hasher = PasswordHasher::with_params(256, 1, 1)?;
    let outcome = create_super_admin(
        &pool,
        &hasher,
        &AdminAccount {
            email: ROOT_EMAIL.to_string(),
            username: "root".to_string(),
            password: ROOT_PASSWORD.to_string(),
            first_name: "Root".to_string(),
            last_name: "Admin".to_string(),
        },
    )
    .await?;
    let ProvisionOutcome::Created { user_id, .. } = outcome else {
        bail!("expected a new super admin");
    };

    let config = AuthConfig::new(SecretString::from("integration-secret".to_string()))
        .with_session_cookie_secure(false)
        .with_password_hasher(hasher);

    let context = AppContext {
        pool: pool.clone(),
        bootstrap: Arc::new(bootstrap),
        auth: Arc::new(AuthState::new(config)),
        runtime: Arc::new(RuntimeInfo {
            environment: Environment::Development,
            debug: false,
            secret_key_set: true,
        }),
    };

    let cors = api::CorsPolicy::new(&[ALLOWED_ORIGIN.to_string()])?;

    Ok(TestApp {
        router: api::app(context, &cors),
        pool,
        root_id: user_id,
    })
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Result<Reply> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(Reply {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Result<Reply> {
        self.send(request(Method::GET, uri, None, cookie)?).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> Result<Reply> {
        self.send(request(Method::POST, uri, Some(body), cookie)?).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookie: Option<&str>) -> Result<Reply> {
        self.send(request(Method::PUT, uri, Some(body), cookie)?).await
    }

    /// Log in and return the `name=value` cookie pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let reply = self
            .post(
                "/api/login",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await?;
        if reply.status != StatusCode::OK {
            bail!("login failed with {}: {}", reply.status, reply.body);
        }
        match reply.session_cookie() {
            Some(cookie) => Ok(cookie),
            None => bail!("login response had no session cookie"),
        }
    }

    pub async fn root_session(&self) -> Result<String> {
        self.login(ROOT_EMAIL, ROOT_PASSWORD).await
    }

    /// Create a user through the console and return its id.
    pub async fn create_user(&self, cookie: &str, username: &str, role: &str) -> Result<i64> {
        let reply = self
            .post(
                "/api/super-admin/create-user",
                serde_json::json!({
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": USER_PASSWORD,
                    "role": role,
                    "first_name": username,
                    "last_name": "Tester",
                }),
                Some(cookie),
            )
            .await?;
        if reply.status != StatusCode::OK {
            bail!("create-user failed with {}: {}", reply.status, reply.body);
        }
        match reply.body["user"]["id"].as_i64() {
            Some(id) => Ok(id),
            None => bail!("create-user response had no id"),
        }
    }
}

pub fn request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };
    Ok(request)
}
