//! User listing, creation and in-place role/status changes.

use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::info;

use super::{
    pagination::{PageRequest, Pagination},
    storage::{
        UserColumn, UserFilter, count_users, institution_exists, list_users, update_user_column,
    },
    types::{
        CreateUserRequest, ListUsersQuery, UpdateRoleRequest, UpdateStatusRequest, UserResponse,
        UsersResponse,
    },
};
use crate::api::{
    error::ApiError,
    handlers::auth::{
        AuthState, Principal, Role, Status,
        storage::{InsertOutcome, NewUser, email_taken, insert_user, username_taken},
        types::{ErrorResponse, UserView},
        utils::{normalize_email, valid_email},
    },
};

#[utoipa::path(
    get,
    path = "/api/super-admin/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users", body = UsersResponse),
        (status = 400, description = "Invalid role filter", body = ErrorResponse),
        (status = 403, description = "Super admin access required", body = ErrorResponse)
    ),
    tag = "super-admin"
)]
pub async fn list(
    pool: Extension<AnyPool>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UsersResponse>, ApiError> {
    let page = PageRequest::from_params(query.page.as_deref(), query.per_page.as_deref());
    let role = match non_empty(query.role.as_deref()) {
        Some(value) => Some(Role::parse(value).ok_or_else(|| ApiError::validation("Invalid role"))?),
        None => None,
    };
    let filter = UserFilter {
        search: non_empty(query.search.as_deref()).map(str::to_string),
        role,
    };

    let total = count_users(&pool, &filter)
        .await
        .map_err(|err| ApiError::internal("Failed to fetch users", err))?;
    let users = list_users(&pool, &filter, page)
        .await
        .map_err(|err| ApiError::internal("Failed to fetch users", err))?;

    Ok(Json(UsersResponse {
        success: true,
        users: users.into_iter().map(UserView::from).collect(),
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/api/super-admin/create-user",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error or duplicate", body = ErrorResponse),
        (status = 403, description = "Super admin access required", body = ErrorResponse)
    ),
    tag = "super-admin"
)]
pub async fn create(
    pool: Extension<AnyPool>,
    auth_state: Extension<Arc<AuthState>>,
    principal: Extension<Principal>,
    payload: Option<Json<CreateUserRequest>>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let email = required(request.email.as_deref(), "email")?;
    let username = required(request.username.as_deref(), "username")?;
    let password = request
        .password
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::validation("password is required"))?;
    let role = required(request.role.as_deref(), "role")?;
    let first_name = required(request.first_name.as_deref(), "first_name")?;
    let last_name = required(request.last_name.as_deref(), "last_name")?;

    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    let role = Role::parse(role).ok_or_else(|| ApiError::validation("Invalid role"))?;

    if let Some(institution_id) = request.institution_id {
        let exists = institution_exists(&pool, institution_id)
            .await
            .map_err(|err| ApiError::internal("Failed to create user", err))?;
        if !exists {
            return Err(ApiError::validation("Institution not found"));
        }
    }

    if email_taken(&pool, &email)
        .await
        .map_err(|err| ApiError::internal("Failed to create user", err))?
    {
        return Err(ApiError::validation("User with this email already exists"));
    }
    if username_taken(&pool, username)
        .await
        .map_err(|err| ApiError::internal("Failed to create user", err))?
    {
        return Err(ApiError::validation("Username already taken"));
    }

    let password_hash = auth_state
        .config()
        .password_hasher()
        .hash(password)
        .map_err(|err| ApiError::internal("Failed to create user", err))?;

    let new_user = NewUser {
        email: &email,
        username,
        password_hash: &password_hash,
        first_name,
        last_name,
        role: role.as_str(),
        status: Status::Active.as_str(),
        institution_id: request.institution_id,
    };
    let user = match insert_user(&pool, &new_user)
        .await
        .map_err(|err| ApiError::internal("Failed to create user", err))?
    {
        InsertOutcome::Created(user) => user,
        InsertOutcome::Conflict => {
            return Err(ApiError::validation(
                "User with this email or username already exists",
            ));
        }
    };

    info!(
        user_id = user.id,
        role = %role,
        created_by = principal.user_id,
        "user created"
    );

    Ok(Json(UserResponse {
        success: true,
        message: "User created successfully".to_string(),
        user: UserView::from(user),
    }))
}

#[utoipa::path(
    put,
    path = "/api/super-admin/users/{id}/role",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 400, description = "Invalid role", body = ErrorResponse),
        (status = 403, description = "Super admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "super-admin"
)]
pub async fn set_role(
    pool: Extension<AnyPool>,
    principal: Extension<Principal>,
    Path(user_id): Path<i64>,
    payload: Option<Json<UpdateRoleRequest>>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let role = required(request.role.as_deref(), "role")?;
    let role = Role::parse(role).ok_or_else(|| ApiError::validation("Invalid role"))?;
    if user_id == principal.user_id {
        return Err(ApiError::validation("Cannot change your own role"));
    }

    let user = update(&pool, user_id, UserColumn::Role, role.as_str()).await?;
    info!(user_id, role = %role, changed_by = principal.user_id, "user role changed");

    Ok(Json(UserResponse {
        success: true,
        message: "User role updated".to_string(),
        user,
    }))
}

#[utoipa::path(
    put,
    path = "/api/super-admin/users/{id}/status",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = UserResponse),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 403, description = "Super admin access required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "super-admin"
)]
pub async fn set_status(
    pool: Extension<AnyPool>,
    principal: Extension<Principal>,
    Path(user_id): Path<i64>,
    payload: Option<Json<UpdateStatusRequest>>,
) -> Result<Json<UserResponse>, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let status = required(request.status.as_deref(), "status")?;
    let status = Status::parse(status).ok_or_else(|| ApiError::validation("Invalid status"))?;
    if user_id == principal.user_id {
        return Err(ApiError::validation("Cannot change your own status"));
    }

    let user = update(&pool, user_id, UserColumn::Status, status.as_str()).await?;
    info!(user_id, status = %status, changed_by = principal.user_id, "user status changed");

    Ok(Json(UserResponse {
        success: true,
        message: "User status updated".to_string(),
        user,
    }))
}

async fn update(
    pool: &AnyPool,
    user_id: i64,
    column: UserColumn,
    value: &str,
) -> Result<UserView, ApiError> {
    update_user_column(pool, user_id, column, value)
        .await
        .map_err(|err| ApiError::internal("Failed to update user", err))?
        .map(UserView::from)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Trimmed field value, or `"<field> is required"`.
pub(super) fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ApiError> {
    non_empty(value).ok_or_else(|| ApiError::validation(format!("{field} is required")))
}
