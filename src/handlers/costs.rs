// src/handlers/costs.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, TenantContext},
        i18n::Locale,
        rbac::{Office, RequireRole},
    },
    models::costs::{Cost, CostCategorySummary, CostInput, CostListQuery, CostPage, DateRangeQuery},
};

// GET /api/costs
#[utoipa::path(
    get,
    path = "/api/costs",
    tag = "Costs",
    params(CostListQuery),
    responses(
        (status = 200, description = "Koszty z sumą filtrowanych kwot", body = CostPage),
        (status = 400, description = "Data od późniejsza niż data do")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_costs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<CostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .cost_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/costs/summary
#[utoipa::path(
    get,
    path = "/api/costs/summary",
    tag = "Costs",
    params(DateRangeQuery),
    responses((status = 200, description = "Suma kosztów wg kategorii", body = Vec<CostCategorySummary>)),
    security(("api_jwt" = []))
)]
pub async fn cost_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .cost_service
        .summary(tenant.0, query.date_from, query.date_to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/costs/{id}
#[utoipa::path(
    get,
    path = "/api/costs/{id}",
    tag = "Costs",
    params(("id" = Uuid, Path, description = "ID kosztu")),
    responses(
        (status = 200, description = "Koszt", body = Cost),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cost = app_state
        .cost_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cost)))
}

// POST /api/costs
#[utoipa::path(
    post,
    path = "/api/costs",
    tag = "Costs",
    request_body = CostInput,
    responses(
        (status = 201, description = "Koszt zapisany", body = Cost),
        (status = 404, description = "Nieznany pojazd, kierowca lub zlecenie")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Json(payload): Json<CostInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cost = app_state
        .cost_service
        .create(tenant.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(cost)))
}

// PUT /api/costs/{id}
#[utoipa::path(
    put,
    path = "/api/costs/{id}",
    tag = "Costs",
    params(("id" = Uuid, Path, description = "ID kosztu")),
    request_body = CostInput,
    responses((status = 200, description = "Koszt zaktualizowany", body = Cost)),
    security(("api_jwt" = []))
)]
pub async fn update_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CostInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cost = app_state
        .cost_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(cost)))
}

// DELETE /api/costs/{id}
#[utoipa::path(
    delete,
    path = "/api/costs/{id}",
    tag = "Costs",
    params(("id" = Uuid, Path, description = "ID kosztu")),
    responses((status = 204, description = "Koszt usunięty")),
    security(("api_jwt" = []))
)]
pub async fn delete_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .cost_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
