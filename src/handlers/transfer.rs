// src/handlers/transfer.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::{attachment, read_file_field},
    middleware::{
        auth::TenantContext,
        i18n::Locale,
        rbac::{Dispatch, Office, RequireRole},
    },
    models::transfer::{ExportEntity, ExportQuery, ImportEntity, ImportResult},
};

// GET /api/export/{entity}
#[utoipa::path(
    get,
    path = "/api/export/{entity}",
    tag = "Transfer",
    params(
        ("entity" = String, Path, description = "orders, costs, invoices, drivers, vehicles, trailers, contractors"),
        ExportQuery
    ),
    responses(
        (status = 200, description = "Plik CSV (UTF-8 z BOM, separator ;), XML lub JSON"),
        (status = 400, description = "Nieobsługiwana encja lub zakres dat")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_entity(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(entity): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entity = ExportEntity::parse(&entity)
        .ok_or_else(|| AppError::InvalidInput("unsupported_entity").to_api_error(&locale, &app_state.i18n_store))?;

    let file = app_state
        .export_service
        .export(tenant.0, entity, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("📤 Eksport {} ({} bajtów)", file.file_name, file.body.len());
    Ok(attachment(&file.file_name, file.content_type, file.body))
}

// POST /api/import/{entity} (multipart/form-data)
#[utoipa::path(
    post,
    path = "/api/import/{entity}",
    tag = "Transfer",
    params(("entity" = String, Path, description = "drivers, vehicles, trailers, contractors")),
    request_body(content_type = "multipart/form-data", description = "Pole `file` z plikiem CSV (nagłówek w pierwszym wierszu)"),
    responses(
        (status = 200, description = "Wynik importu z błędami per wiersz", body = ImportResult),
        (status = 400, description = "Brak pliku, pusty plik lub brak wymaganej kolumny")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_entity(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Dispatch>,
    Path(entity): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let entity = ImportEntity::parse(&entity)
        .ok_or_else(|| AppError::InvalidInput("unsupported_entity").to_api_error(&locale, &app_state.i18n_store))?;

    let data = read_file_field(multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .import_service
        .import(tenant.0, entity, &data, &locale, &app_state.i18n_store)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}
