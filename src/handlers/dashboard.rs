// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::TenantContext,
        i18n::Locale,
        rbac::{Office, RequireRole},
    },
    models::dashboard::{AlertQuery, DashboardSummary, ExpiryAlert, MonthlyChartEntry},
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Liczniki floty i wynik bieżącego miesiąca", body = DashboardSummary),
        (status = 401, description = "Brak tokenu")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .summary(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/monthly-chart
#[utoipa::path(
    get,
    path = "/api/dashboard/monthly-chart",
    tag = "Dashboard",
    responses((status = 200, description = "Przychody i koszty z ostatnich 12 miesięcy", body = Vec<MonthlyChartEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_monthly_chart(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
) -> Result<impl IntoResponse, ApiError> {
    let chart = app_state
        .dashboard_service
        .monthly_chart(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(chart)))
}

// GET /api/dashboard/alerts
#[utoipa::path(
    get,
    path = "/api/dashboard/alerts",
    tag = "Dashboard",
    params(AlertQuery),
    responses((status = 200, description = "Terminy wygasające w ciągu N dni (domyślnie 30)", body = Vec<ExpiryAlert>)),
    security(("api_jwt" = []))
)]
pub async fn get_alerts(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<AlertQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = app_state
        .dashboard_service
        .expiry_alerts(tenant.0, query.days)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(alerts)))
}
