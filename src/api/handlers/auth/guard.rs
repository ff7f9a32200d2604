//! Role gate for privileged routes.
//!
//! The check is a single comparison of the session's cached role against the
//! required one. It runs before the wrapped handler and does not look at the
//! request body.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use super::{
    principal::{Principal, current_session},
    roles::Role,
    state::AuthState,
    store::SessionRecord,
};
use crate::api::error::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionGuard {
    required: Role,
}

impl SessionGuard {
    #[must_use]
    pub const fn new(required: Role) -> Self {
        Self { required }
    }

    #[must_use]
    pub const fn super_admin() -> Self {
        Self::new(Role::SuperAdmin)
    }

    #[must_use]
    pub const fn required(&self) -> Role {
        self.required
    }

    /// Authorize a session, or reject with 403.
    ///
    /// # Errors
    /// Returns [`ApiError::Forbidden`] when there is no session or its role differs.
    pub fn check(&self, session: Option<SessionRecord>) -> Result<Principal, ApiError> {
        match session {
            Some(record) if Role::parse(&record.role) == Some(self.required) => {
                Ok(Principal::from(record))
            }
            _ => Err(ApiError::forbidden(format!(
                "{} access required",
                self.required.label()
            ))),
        }
    }
}

/// Middleware: run [`SessionGuard::check`] and expose the [`Principal`] to handlers.
pub async fn require_role(
    State(guard): State<SessionGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(auth_state) = request.extensions().get::<Arc<AuthState>>().cloned() else {
        return ApiError::internal(
            "Authorization unavailable",
            anyhow::anyhow!("auth state extension missing"),
        )
        .into_response();
    };

    let session = current_session(request.headers(), &auth_state).await;
    match guard.check(session) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => {
            warn!(
                path = %request.uri().path(),
                required = %guard.required(),
                "session guard rejected request"
            );
            err.into_response()
        }
    }
}
