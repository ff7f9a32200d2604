//! Institution listing and creation.

use axum::{
    Json,
    extract::{Extension, Query},
};
use sqlx::AnyPool;
use tracing::info;

use super::{
    pagination::{PageRequest, Pagination},
    storage::{
        InstitutionFilter, InstitutionOutcome, NewInstitution, count_institutions,
        list_institutions,
    },
    types::{
        CreateInstitutionRequest, InstitutionResponse, InstitutionsResponse,
        ListInstitutionsQuery,
    },
    users::required,
};
use crate::api::{
    error::ApiError,
    handlers::auth::{Principal, Status, types::ErrorResponse},
};

#[utoipa::path(
    get,
    path = "/api/super-admin/institutions",
    params(ListInstitutionsQuery),
    responses(
        (status = 200, description = "Page of institutions with member counts", body = InstitutionsResponse),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 403, description = "Super admin access required", body = ErrorResponse)
    ),
    tag = "super-admin"
)]
pub async fn list(
    pool: Extension<AnyPool>,
    Query(query): Query<ListInstitutionsQuery>,
) -> Result<Json<InstitutionsResponse>, ApiError> {
    let page = PageRequest::from_params(query.page.as_deref(), query.per_page.as_deref());
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => {
            Some(Status::parse(value).ok_or_else(|| ApiError::validation("Invalid status"))?)
        }
        None => None,
    };
    let filter = InstitutionFilter {
        search: query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        status,
    };

    let total = count_institutions(&pool, &filter)
        .await
        .map_err(|err| ApiError::internal("Failed to fetch institutions", err))?;
    let institutions = list_institutions(&pool, &filter, page)
        .await
        .map_err(|err| ApiError::internal("Failed to fetch institutions", err))?;

    Ok(Json(InstitutionsResponse {
        success: true,
        institutions,
        pagination: Pagination::new(page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/api/super-admin/institutions",
    request_body = CreateInstitutionRequest,
    responses(
        (status = 200, description = "Institution created", body = InstitutionResponse),
        (status = 400, description = "Validation error or duplicate name", body = ErrorResponse),
        (status = 403, description = "Super admin access required", body = ErrorResponse)
    ),
    tag = "super-admin"
)]
pub async fn create(
    pool: Extension<AnyPool>,
    principal: Extension<Principal>,
    payload: Option<Json<CreateInstitutionRequest>>,
) -> Result<Json<InstitutionResponse>, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let name = required(request.name.as_deref(), "name")?;
    let institution_type = required(request.institution_type.as_deref(), "type")?;
    let location = required(request.location.as_deref(), "location")?;
    let status = match request.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Status::parse(value).ok_or_else(|| ApiError::validation("Invalid status"))?,
        None => Status::Active,
    };

    let outcome = super::storage::insert_institution(
        &pool,
        &NewInstitution {
            name,
            institution_type,
            location,
            status,
        },
    )
    .await
    .map_err(|err| ApiError::internal("Failed to create institution", err))?;

    let institution = match outcome {
        InstitutionOutcome::Created(institution) => institution,
        InstitutionOutcome::Conflict => {
            return Err(ApiError::validation(
                "Institution with this name already exists",
            ));
        }
    };

    info!(
        institution_id = institution.id,
        created_by = principal.user_id,
        "institution created"
    );

    Ok(Json(InstitutionResponse {
        success: true,
        message: "Institution created successfully".to_string(),
        institution,
    }))
}
