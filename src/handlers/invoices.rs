// src/handlers/invoices.rs

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
        auth::TenantContext,
        i18n::Locale,
        rbac::{Accounting, Office, RequireRole},
    },
    models::invoices::{
        Invoice, InvoiceDetail, InvoiceFromOrderInput, InvoiceInput, InvoiceListItem, InvoiceListQuery,
        InvoiceStatusInput,
    },
};

// GET /api/invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(InvoiceListQuery),
    responses((status = 200, description = "Lista faktur", body = Paginated<InvoiceListItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .invoice_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoices)))
}

// GET /api/invoices/{id}
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID faktury")),
    responses(
        (status = 200, description = "Faktura z pozycjami", body = InvoiceDetail),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .invoice_service
        .detail(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = InvoiceInput,
    responses(
        (status = 201, description = "Faktura wystawiona", body = InvoiceDetail),
        (status = 400, description = "Błędne pozycje lub stawka VAT")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Accounting>,
    Json(payload): Json<InvoiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .invoice_service
        .create(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// POST /api/invoices/from-order/{order_id}
#[utoipa::path(
    post,
    path = "/api/invoices/from-order/{order_id}",
    tag = "Invoices",
    params(("order_id" = Uuid, Path, description = "ID zlecenia")),
    request_body = InvoiceFromOrderInput,
    responses(
        (status = 201, description = "Faktura ze zlecenia", body = InvoiceDetail),
        (status = 409, description = "Zlecenie niedostarczone lub już zafakturowane")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invoice_from_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Accounting>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<InvoiceFromOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .invoice_service
        .create_from_order(tenant.0, order_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// PUT /api/invoices/{id}
#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID faktury")),
    request_body = InvoiceInput,
    responses(
        (status = 200, description = "Faktura zaktualizowana", body = InvoiceDetail),
        (status = 409, description = "Tylko szkic można edytować")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Accounting>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoiceInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .invoice_service
        .update(tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/invoices/{id}/status
#[utoipa::path(
    put,
    path = "/api/invoices/{id}/status",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID faktury")),
    request_body = InvoiceStatusInput,
    responses(
        (status = 200, description = "Status faktury zmieniony", body = Invoice),
        (status = 409, description = "Niedozwolona zmiana statusu")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_invoice_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Accounting>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoiceStatusInput>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .change_status(tenant.0, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoice)))
}

// DELETE /api/invoices/{id}
#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID faktury")),
    responses(
        (status = 204, description = "Szkic usunięty"),
        (status = 409, description = "Wystawionej faktury nie można usunąć")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Accounting>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .invoice_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/invoices/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/invoices/{id}/pdf",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID faktury")),
    responses(
        (status = 200, description = "Faktura VAT (PDF)", content_type = "application/pdf"),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_invoice_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (file_name, body) = app_state
        .document_service
        .generate_invoice_pdf(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment(&file_name, "application/pdf", body))
}
