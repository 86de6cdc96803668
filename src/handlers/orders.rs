// src/handlers/orders.rs

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
    handlers::attachment,
    middleware::{
        auth::{AuthenticatedUser, TenantContext},
        i18n::Locale,
        rbac::{Dispatch, Office, RequireRole},
    },
    models::orders::{
        AssignmentInput, Order, OrderAssignment, OrderDetail, OrderInput, OrderListItem, OrderListQuery,
        StatusChangeInput,
    },
};

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses((status = 200, description = "Lista zleceń", body = Paginated<OrderListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .order_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    responses(
        (status = 200, description = "Zlecenie z przypisaniami i historią", body = OrderDetail),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .order_service
        .detail(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = OrderInput,
    responses(
        (status = 201, description = "Zlecenie utworzone", body = Order),
        (status = 400, description = "Błędne dane"),
        (status = 404, description = "Nieznany kontrahent")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Json(payload): Json<OrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .create(tenant.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// PUT /api/orders/{id}
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    request_body = OrderInput,
    responses(
        (status = 200, description = "Zlecenie zaktualizowane", body = Order),
        (status = 409, description = "Zlecenie zakończone lub anulowane")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// PUT /api/orders/{id}/status
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    request_body = StatusChangeInput,
    responses(
        (status = 200, description = "Status zmieniony", body = Order),
        (status = 409, description = "Niedozwolona zmiana statusu")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .change_status(tenant.0, user.0.id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// DELETE /api/orders/{id}
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    responses(
        (status = 204, description = "Zlecenie usunięte"),
        (status = 409, description = "Zlecenie w realizacji lub zafakturowane")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .order_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/orders/{id}/assignments
#[utoipa::path(
    post,
    path = "/api/orders/{id}/assignments",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    request_body = AssignmentInput,
    responses(
        (status = 201, description = "Zasób przypisany", body = OrderAssignment),
        (status = 409, description = "Zasób już przypisany lub nieaktywny")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let assignment = app_state
        .order_service
        .add_assignment(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

// DELETE /api/orders/{id}/assignments/{assignment_id}
#[utoipa::path(
    delete,
    path = "/api/orders/{id}/assignments/{assignment_id}",
    tag = "Orders",
    params(
        ("id" = Uuid, Path, description = "ID zlecenia"),
        ("assignment_id" = Uuid, Path, description = "ID przypisania")
    ),
    responses(
        (status = 204, description = "Przypisanie usunięte"),
        (status = 409, description = "Zlecenie w trasie wymaga kierowcy i pojazdu")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path((id, assignment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .order_service
        .remove_assignment(tenant.0, id, assignment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/orders/{id}/cmr
#[utoipa::path(
    get,
    path = "/api/orders/{id}/cmr",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    responses(
        (status = 200, description = "List przewozowy CMR (PDF)", content_type = "application/pdf"),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_cmr(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (file_name, body) = app_state
        .document_service
        .generate_cmr_pdf(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment(&file_name, "application/pdf", body))
}
