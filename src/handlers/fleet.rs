// src/handlers/fleet.rs

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
    models::fleet::{Trailer, TrailerInput, TrailerListQuery, Vehicle, VehicleInput, VehicleListQuery},
};

// --- Veículos ---

// GET /api/vehicles
#[utoipa::path(
    get,
    path = "/api/vehicles",
    tag = "Fleet",
    params(VehicleListQuery),
    responses((status = 200, description = "Lista pojazdów", body = Paginated<Vehicle>)),
    security(("api_jwt" = []))
)]
pub async fn list_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<VehicleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicles = app_state
        .fleet_service
        .list_vehicles(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicles)))
}

// GET /api/vehicles/{id}
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}",
    tag = "Fleet",
    params(("id" = Uuid, Path, description = "ID pojazdu")),
    responses(
        (status = 200, description = "Pojazd", body = Vehicle),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = app_state
        .fleet_service
        .get_vehicle(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicle)))
}

// POST /api/vehicles
#[utoipa::path(
    post,
    path = "/api/vehicles",
    tag = "Fleet",
    request_body = VehicleInput,
    responses(
        (status = 201, description = "Pojazd dodany", body = Vehicle),
        (status = 409, description = "Numer rejestracyjny już istnieje")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Json(payload): Json<VehicleInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .fleet_service
        .create_vehicle(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

// PUT /api/vehicles/{id}
#[utoipa::path(
    put,
    path = "/api/vehicles/{id}",
    tag = "Fleet",
    params(("id" = Uuid, Path, description = "ID pojazdu")),
    request_body = VehicleInput,
    responses(
        (status = 200, description = "Pojazd zaktualizowany", body = Vehicle),
        (status = 409, description = "Pojazd jest w trasie")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VehicleInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .fleet_service
        .update_vehicle(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicle)))
}

// DELETE /api/vehicles/{id}
#[utoipa::path(
    delete,
    path = "/api/vehicles/{id}",
    tag = "Fleet",
    params(("id" = Uuid, Path, description = "ID pojazdu")),
    responses(
        (status = 204, description = "Pojazd dezaktywowany"),
        (status = 409, description = "Pojazd ma aktywne zlecenia")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .fleet_service
        .deactivate_vehicle(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// --- Reboques ---

// GET /api/trailers
#[utoipa::path(
    get,
    path = "/api/trailers",
    tag = "Fleet",
    params(TrailerListQuery),
    responses((status = 200, description = "Lista naczep", body = Paginated<Trailer>)),
    security(("api_jwt" = []))
)]
pub async fn list_trailers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<TrailerListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let trailers = app_state
        .fleet_service
        .list_trailers(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(trailers)))
}

// GET /api/trailers/{id}
#[utoipa::path(
    get,
    path = "/api/trailers/{id}",
    tag = "Fleet",
    params(("id" = Uuid, Path, description = "ID naczepy")),
    responses(
        (status = 200, description = "Naczepa", body = Trailer),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_trailer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let trailer = app_state
        .fleet_service
        .get_trailer(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(trailer)))
}

// POST /api/trailers
#[utoipa::path(
    post,
    path = "/api/trailers",
    tag = "Fleet",
    request_body = TrailerInput,
    responses(
        (status = 201, description = "Naczepa dodana", body = Trailer),
        (status = 409, description = "Numer rejestracyjny już istnieje")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_trailer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Json(payload): Json<TrailerInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let trailer = app_state
        .fleet_service
        .create_trailer(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(trailer)))
}

// PUT /api/trailers/{id}
#[utoipa::path(
    put,
    path = "/api/trailers/{id}",
    tag = "Fleet",
    params(("id" = Uuid, Path, description = "ID naczepy")),
    request_body = TrailerInput,
    responses((status = 200, description = "Naczepa zaktualizowana", body = Trailer)),
    security(("api_jwt" = []))
)]
pub async fn update_trailer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TrailerInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let trailer = app_state
        .fleet_service
        .update_trailer(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(trailer)))
}

// DELETE /api/trailers/{id}
#[utoipa::path(
    delete,
    path = "/api/trailers/{id}",
    tag = "Fleet",
    params(("id" = Uuid, Path, description = "ID naczepy")),
    responses(
        (status = 204, description = "Naczepa dezaktywowana"),
        (status = 409, description = "Naczepa ma aktywne zlecenia")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_trailer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .fleet_service
        .deactivate_trailer(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
