// src/handlers/notes.rs
// Notas da equipe com comentários e reações. Só o autor ou um administrador edita.

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
        auth::{AuthenticatedUser, TenantContext},
        i18n::Locale,
        rbac::{Office, RequireRole},
    },
    models::notes::{
        CommentInput, Note, NoteComment, NoteDetail, NoteInput, NoteListQuery, ReactionInput, ReactionToggle,
    },
};

// GET /api/notes
#[utoipa::path(
    get,
    path = "/api/notes",
    tag = "Notes",
    params(NoteListQuery),
    responses((status = 200, description = "Notatki (przypięte najpierw)", body = Paginated<Note>)),
    security(("api_jwt" = []))
)]
pub async fn list_notes(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Query(query): Query<NoteListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = app_state
        .note_service
        .list(tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(notes)))
}

// GET /api/notes/{id}
#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "ID notatki")),
    responses(
        (status = 200, description = "Notatka z komentarzami i reakcjami", body = NoteDetail),
        (status = 404, description = "Nie znaleziono")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_note(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .note_service
        .detail(tenant.0, &user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/notes
#[utoipa::path(
    post,
    path = "/api/notes",
    tag = "Notes",
    request_body = NoteInput,
    responses((status = 201, description = "Notatka dodana", body = NoteDetail)),
    security(("api_jwt" = []))
)]
pub async fn create_note(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Json(payload): Json<NoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .note_service
        .create(tenant.0, &user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// PUT /api/notes/{id}
#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "ID notatki")),
    request_body = NoteInput,
    responses(
        (status = 200, description = "Notatka zaktualizowana", body = NoteDetail),
        (status = 403, description = "Tylko autor lub administrator")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_note(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .note_service
        .update(tenant.0, &user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// DELETE /api/notes/{id}
#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "ID notatki")),
    responses(
        (status = 204, description = "Notatka usunięta"),
        (status = 403, description = "Tylko autor lub administrator")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_note(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .note_service
        .delete(tenant.0, &user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/notes/{id}/comments
#[utoipa::path(
    post,
    path = "/api/notes/{id}/comments",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "ID notatki")),
    request_body = CommentInput,
    responses((status = 201, description = "Komentarz dodany", body = NoteComment)),
    security(("api_jwt" = []))
)]
pub async fn add_comment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let comment = app_state
        .note_service
        .add_comment(tenant.0, &user, id, &payload.content)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

// DELETE /api/notes/{id}/comments/{comment_id}
#[utoipa::path(
    delete,
    path = "/api/notes/{id}/comments/{comment_id}",
    tag = "Notes",
    params(
        ("id" = Uuid, Path, description = "ID notatki"),
        ("comment_id" = Uuid, Path, description = "ID komentarza")
    ),
    responses((status = 204, description = "Komentarz usunięty")),
    security(("api_jwt" = []))
)]
pub async fn delete_comment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .note_service
        .delete_comment(tenant.0, &user, id, comment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/notes/{id}/reactions
#[utoipa::path(
    post,
    path = "/api/notes/{id}/reactions",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "ID notatki")),
    request_body = ReactionInput,
    responses((status = 200, description = "Reakcja przełączona", body = ReactionToggle)),
    security(("api_jwt" = []))
)]
pub async fn toggle_reaction(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Office>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReactionInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let toggle = app_state
        .note_service
        .toggle_reaction(tenant.0, &user, id, &payload.emoji)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(toggle)))
}
