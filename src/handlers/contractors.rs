// src/handlers/contractors.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::Paginated,
    },
    config::AppState,
    middleware::{
        auth::TenantContext,
        i18n::Locale,
        rbac::{Dispatch, Office, RequireRole},
    },
    models::contractors::{Contractor, ContractorInput, ContractorListQuery},
};

// GET /api/contractors
#[utoipa::path(
    get,
    path = "/api/contractors",
    tag = "Contractors",
    params(ContractorListQuery),
    responses((status = 200, description = "Lista kontrahentów", body = Paginated<Contractor>)),
    security(("api_jwt" = []))
)]
pub async fn list_contractors(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<ContractorListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let contractors = app_state
        .contractor_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(contractors)))
}

// GET /api/contractors/{id}
#[utoipa::path(
    get,
    path = "/api/contractors/{id}",
    tag = "Contractors",
    params(("id" = Uuid, Path, description = "ID kontrahenta")),
    responses(
        (status = 200, description = "Kontrahent", body = Contractor),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_contractor(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let contractor = app_state
        .contractor_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(contractor)))
}

// POST /api/contractors
#[utoipa::path(
    post,
    path = "/api/contractors",
    tag = "Contractors",
    request_body = ContractorInput,
    responses(
        (status = 201, description = "Kontrahent dodany", body = Contractor),
        (status = 409, description = "NIP już istnieje")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_contractor(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Json(payload): Json<ContractorInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let contractor = app_state
        .contractor_service
        .create(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(contractor)))
}

// PUT /api/contractors/{id}
#[utoipa::path(
    put,
    path = "/api/contractors/{id}",
    tag = "Contractors",
    params(("id" = Uuid, Path, description = "ID kontrahenta")),
    request_body = ContractorInput,
    responses((status = 200, description = "Kontrahent zaktualizowany", body = Contractor)),
    security(("api_jwt" = []))
)]
pub async fn update_contractor(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContractorInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let contractor = app_state
        .contractor_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(contractor)))
}

// DELETE /api/contractors/{id}
#[utoipa::path(
    delete,
    path = "/api/contractors/{id}",
    tag = "Contractors",
    params(("id" = Uuid, Path, description = "ID kontrahenta")),
    responses(
        (status = 204, description = "Kontrahent dezaktywowany"),
        (status = 409, description = "Kontrahent ma aktywne zlecenia")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_contractor(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .contractor_service
        .deactivate(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
