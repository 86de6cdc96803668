// src/handlers/documents.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, pagination::Paginated},
    config::AppState,
    handlers::{attachment, read_document_upload},
    middleware::{
        auth::{AuthenticatedUser, TenantContext},
        i18n::Locale,
        rbac::{Office, RequireRole},
    },
    models::documents::{Document, DocumentListQuery},
};

// GET /api/documents
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "Documents",
    params(DocumentListQuery),
    responses((status = 200, description = "Lista dokumentów", body = Paginated<Document>)),
    security(("api_jwt" = []))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = app_state
        .document_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(documents)))
}

// GET /api/documents/{id}
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID dokumentu")),
    responses(
        (status = 200, description = "Metadane dokumentu", body = Document),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_document(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let document = app_state
        .document_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(document)))
}

// POST /api/documents (multipart/form-data)
#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "Documents",
    request_body(content_type = "multipart/form-data", description = "Pole `file` oraz documentType, title, orderId, driverId, vehicleId, trailerId, expiryDate"),
    responses(
        (status = 201, description = "Dokument zapisany", body = Document),
        (status = 400, description = "Brak pliku, zły typ lub za duży plik")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_document(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_document_upload(multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let document = app_state
        .document_service
        .upload(tenant.0, user.0.id, upload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(document)))
}

// GET /api/documents/{id}/download
#[utoipa::path(
    get,
    path = "/api/documents/{id}/download",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID dokumentu")),
    responses(
        (status = 200, description = "Zawartość pliku", content_type = "application/octet-stream"),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_document(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (document, body) = app_state
        .document_service
        .download(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(attachment(&document.file_name, &document.mime_type, body))
}

// DELETE /api/documents/{id}
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID dokumentu")),
    responses((status = 204, description = "Dokument usunięty")),
    security(("api_jwt" = []))
)]
pub async fn delete_document(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .document_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
