//! Universal login, logout and session lookup.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    password::{PasswordHasher, verify_password},
    principal::require_auth,
    roles::{Status, dashboard_for, permissions_for},
    session::{clear_session_cookie, extract_session_token, session_cookie},
    state::AuthState,
    storage::{UserRecord, find_user_by_email},
    types::{ErrorResponse, LoginRequest, LoginResponse, LogoutResponse, SessionResponse, UserView},
    utils::normalize_email,
};
use crate::api::error::{ApiError, AuthError};

/// Check an email/password pair against the account store.
///
/// Lookup, password verification and the status check run in that order, so
/// an inactive account with a wrong password still reports bad credentials.
/// An unknown email still pays for one Argon2 verification.
///
/// # Errors
/// [`AuthError`] for credential failures, [`ApiError::Internal`] when the store fails.
pub(crate) async fn authenticate(
    pool: &AnyPool,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<UserRecord, ApiError> {
    let email = normalize_email(email);
    let Some(user) = find_user_by_email(pool, &email)
        .await
        .map_err(|err| ApiError::internal("Login failed", err))?
    else {
        hasher.verify_unknown(password);
        return Err(AuthError::NotFound.into());
    };

    if !verify_password(&user.password_hash, password) {
        return Err(AuthError::InvalidCredentials.into());
    }

    if Status::parse(&user.status) != Some(Status::Active) {
        return Err(AuthError::AccountInactive.into());
    }

    Ok(user)
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success; session cookie set", body = LoginResponse),
        (status = 400, description = "Email and password required", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account is not active", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let (Some(email), Some(password)) = (
        request.email.filter(|value| !value.trim().is_empty()),
        request.password.filter(|value| !value.is_empty()),
    ) else {
        return Err(ApiError::validation("Email and password required"));
    };

    let hasher = auth_state.config().password_hasher();
    let user = match authenticate(&pool, hasher, &email, &password).await {
        Ok(user) => user,
        Err(err) => {
            if let ApiError::Auth(reason) = &err {
                warn!(reason = %reason, "login rejected");
            }
            return Err(err);
        }
    };

    // A new login replaces whatever session the caller already had.
    if let Some(previous) = extract_session_token(&headers) {
        auth_state.sessions().remove(&previous).await;
    }

    let token = auth_state
        .sessions()
        .create(user.id, user.email.clone(), user.role.clone())
        .await
        .map_err(|err| ApiError::internal("Login failed", err))?;
    let cookie = session_cookie(auth_state.config(), &token)
        .map_err(|err| ApiError::internal("Login failed", err))?;

    info!(user_id = user.id, role = %user.role, "login succeeded");

    let body = LoginResponse {
        success: true,
        redirect_to: dashboard_for(&user.role).to_string(),
        permissions: permissions_for(&user.role),
        user: UserView::from(user),
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Session dropped and cookie cleared", body = LogoutResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Response, ApiError> {
    let sessions = auth_state.sessions();
    if let Some(token) = extract_session_token(&headers) {
        sessions.remove(&token).await;
    }
    let purged = sessions.purge_expired().await;
    if purged > 0 {
        let active_sessions = sessions.len().await;
        debug!(purged, active_sessions, "expired sessions purged");
    }

    let cookie = clear_session_cookie(auth_state.config())
        .map_err(|err| ApiError::internal("Logout failed", err))?;
    let body = LogoutResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "No active session", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let principal = require_auth(&headers, &auth_state).await?;
    Ok(Json(SessionResponse {
        success: true,
        user_id: principal.user_id,
        redirect_to: dashboard_for(&principal.role).to_string(),
        permissions: principal.permissions(),
        email: principal.email,
        role: principal.role,
    }))
}
