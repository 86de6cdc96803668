// src/handlers/drivers.rs

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
    models::drivers::{Driver, DriverInput, DriverListQuery},
};

// GET /api/drivers
#[utoipa::path(
    get,
    path = "/api/drivers",
    tag = "Drivers",
    params(DriverListQuery),
    responses((status = 200, description = "Lista kierowców", body = Paginated<Driver>)),
    security(("api_jwt" = []))
)]
pub async fn list_drivers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<DriverListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let drivers = app_state
        .driver_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(drivers)))
}

// GET /api/drivers/{id}
#[utoipa::path(
    get,
    path = "/api/drivers/{id}",
    tag = "Drivers",
    params(("id" = Uuid, Path, description = "ID kierowcy")),
    responses(
        (status = 200, description = "Kierowca", body = Driver),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let driver = app_state
        .driver_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(driver)))
}

// POST /api/drivers
#[utoipa::path(
    post,
    path = "/api/drivers",
    tag = "Drivers",
    request_body = DriverInput,
    responses(
        (status = 201, description = "Kierowca dodany", body = Driver),
        (status = 409, description = "Numer prawa jazdy już istnieje")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Json(payload): Json<DriverInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let driver = app_state
        .driver_service
        .create(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(driver)))
}

// PUT /api/drivers/{id}
#[utoipa::path(
    put,
    path = "/api/drivers/{id}",
    tag = "Drivers",
    params(("id" = Uuid, Path, description = "ID kierowcy")),
    request_body = DriverInput,
    responses(
        (status = 200, description = "Kierowca zaktualizowany", body = Driver),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DriverInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let driver = app_state
        .driver_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(driver)))
}

// DELETE /api/drivers/{id}
#[utoipa::path(
    delete,
    path = "/api/drivers/{id}",
    tag = "Drivers",
    params(("id" = Uuid, Path, description = "ID kierowcy")),
    responses(
        (status = 204, description = "Kierowca dezaktywowany"),
        (status = 409, description = "Kierowca ma aktywne zlecenia")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .driver_service
        .deactivate(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/drivers/{id}/reactivate
#[utoipa::path(
    post,
    path = "/api/drivers/{id}/reactivate",
    tag = "Drivers",
    params(("id" = Uuid, Path, description = "ID kierowcy")),
    responses((status = 204, description = "Kierowca ponownie aktywny")),
    security(("api_jwt" = []))
)]
pub async fn reactivate_driver(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .driver_service
        .reactivate(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
