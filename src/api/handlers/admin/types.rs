//! Request/response types for the super-admin console.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use crate::api::handlers::auth::types::UserView;

/// Raw list query. Values stay strings so malformed numbers fall back to defaults.
#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    /// Case-insensitive substring over email, username and names.
    pub search: Option<String>,
    /// Exact role filter.
    pub role: Option<String>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListInstitutionsQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    /// Case-insensitive substring over name, location and type.
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserView>,
    pub pagination: Pagination,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub institution_id: Option<i64>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: UserView,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UserStats {
    pub total: i64,
    pub super_admins: i64,
    pub admins: i64,
    pub alumni: i64,
    pub students: i64,
    pub active: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstitutionStats {
    pub total: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub users: UserStats,
    pub institutions: InstitutionStats,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: DashboardStats,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InstitutionView {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub institution_type: String,
    pub location: String,
    pub status: String,
    pub admin_count: i64,
    pub student_count: i64,
    pub alumni_count: i64,
    pub created_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct InstitutionsResponse {
    pub success: bool,
    pub institutions: Vec<InstitutionView>,
    pub pagination: Pagination,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct CreateInstitutionRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub institution_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct InstitutionResponse {
    pub success: bool,
    pub message: String,
    pub institution: InstitutionView,
}
