use axum::{Json, extract::Extension};
use sqlx::AnyPool;

use super::{
    storage::{InstitutionFilter, count_institutions, user_stats},
    types::{DashboardStats, InstitutionStats, StatsResponse},
};
use crate::api::{error::ApiError, handlers::auth::types::ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/super-admin/dashboard-stats",
    responses(
        (status = 200, description = "User and institution counts", body = StatsResponse),
        (status = 403, description = "Super admin access required", body = ErrorResponse)
    ),
    tag = "super-admin"
)]
pub async fn dashboard_stats(pool: Extension<AnyPool>) -> Result<Json<StatsResponse>, ApiError> {
    let users = user_stats(&pool)
        .await
        .map_err(|err| ApiError::internal("Failed to fetch dashboard stats", err))?;
    let institutions = count_institutions(&pool, &InstitutionFilter::default())
        .await
        .map_err(|err| ApiError::internal("Failed to fetch dashboard stats", err))?;

    Ok(Json(StatsResponse {
        success: true,
        stats: DashboardStats {
            users,
            institutions: InstitutionStats {
                total: institutions,
            },
        },
    }))
}
