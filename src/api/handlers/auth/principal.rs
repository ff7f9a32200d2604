//! Authenticated principal extraction.

use axum::http::HeaderMap;

use super::{
    roles::{Permissions, permissions_for},
    session::extract_session_token,
    state::AuthState,
    store::SessionRecord,
};
use crate::api::error::ApiError;

/// Authenticated user context derived from the session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

impl Principal {
    #[must_use]
    pub fn permissions(&self) -> Permissions {
        permissions_for(&self.role)
    }
}

impl From<SessionRecord> for Principal {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_id: record.user_id,
            email: record.email,
            role: record.role,
        }
    }
}

/// Resolve the request's session, if any.
pub(crate) async fn current_session(headers: &HeaderMap, auth_state: &AuthState) -> Option<SessionRecord> {
    let token = extract_session_token(headers)?;
    auth_state.sessions().get(&token).await
}

/// Resolve the session into a principal, or fail with 401.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<Principal, ApiError> {
    current_session(headers, auth_state)
        .await
        .map(Principal::from)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}
