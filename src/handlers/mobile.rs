// src/handlers/mobile.rs
// Rotas do aplicativo do motorista. O motorista vem sempre do token.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::read_document_upload,
    middleware::{
        auth::{AuthenticatedUser, TenantContext},
        i18n::Locale,
        rbac::{DriverOnly, RequireRole},
    },
    models::{
        auth::{AuthResponse, LoginPayload, User},
        costs::{Cost, CostInput},
        documents::Document,
        orders::{Order, OrderDetail, OrderListItem, StatusChangeInput},
    },
};

fn linked_driver(user: &User) -> Result<Uuid, AppError> {
    user.driver_id.ok_or(AppError::Forbidden)
}

// POST /api/mobile/auth/login
#[utoipa::path(
    post,
    path = "/api/mobile/auth/login",
    tag = "Mobile",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Zalogowano kierowcę", body = AuthResponse),
        (status = 401, description = "Błędny e-mail lub hasło"),
        (status = 403, description = "Konto nie jest powiązane z kierowcą")
    )
)]
pub async fn mobile_login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .auth_service
        .mobile_login(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/mobile/orders
#[utoipa::path(
    get,
    path = "/api/mobile/orders",
    tag = "Mobile",
    responses((status = 200, description = "Aktywne zlecenia kierowcy", body = Vec<OrderListItem>)),
    security(("api_jwt" = []))
)]
pub async fn my_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<DriverOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let driver_id = linked_driver(&user).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .order_service
        .list_for_driver(tenant.0, driver_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/mobile/orders/{id}
#[utoipa::path(
    get,
    path = "/api/mobile/orders/{id}",
    tag = "Mobile",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    responses(
        (status = 200, description = "Szczegóły zlecenia", body = OrderDetail),
        (status = 404, description = "Zlecenie nie jest przypisane do kierowcy")
    ),
    security(("api_jwt" = []))
)]
pub async fn my_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<DriverOnly>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let driver_id = linked_driver(&user).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .order_service
        .driver_detail(tenant.0, driver_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/mobile/orders/{id}/status
#[utoipa::path(
    post,
    path = "/api/mobile/orders/{id}/status",
    tag = "Mobile",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    request_body = StatusChangeInput,
    responses(
        (status = 200, description = "Status zmieniony", body = Order),
        (status = 400, description = "Status niedostępny dla kierowcy"),
        (status = 409, description = "Niedozwolona zmiana statusu")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_my_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<DriverOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    let driver_id = linked_driver(&user).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .driver_change_status(tenant.0, user.id, driver_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// POST /api/mobile/costs
#[utoipa::path(
    post,
    path = "/api/mobile/costs",
    tag = "Mobile",
    request_body = CostInput,
    responses((status = 201, description = "Koszt zgłoszony", body = Cost)),
    security(("api_jwt" = []))
)]
pub async fn report_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<DriverOnly>,
    Json(payload): Json<CostInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    let driver_id = linked_driver(&user).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cost = app_state
        .cost_service
        .create_for_driver(tenant.0, user.id, driver_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(cost)))
}

// POST /api/mobile/orders/{id}/documents (multipart/form-data)
#[utoipa::path(
    post,
    path = "/api/mobile/orders/{id}/documents",
    tag = "Mobile",
    params(("id" = Uuid, Path, description = "ID zlecenia")),
    request_body(content_type = "multipart/form-data", description = "Pole `file` (zdjęcie lub skan CMR) oraz opcjonalnie documentType i title"),
    responses(
        (status = 201, description = "Dokument zapisany", body = Document),
        (status = 404, description = "Zlecenie nie jest przypisane do kierowcy")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_order_document(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<DriverOnly>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let driver_id = linked_driver(&user).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let upload = read_document_upload(multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let document = app_state
        .document_service
        .upload_for_driver(tenant.0, user.id, driver_id, id, upload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(document)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use chrono::Utc;

    fn driver_user(driver_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "kierowca@firma.pl".into(),
            password_hash: String::new(),
            first_name: "Piotr".into(),
            last_name: "Nowak".into(),
            role: UserRole::Driver,
            driver_id,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn driver_comes_from_user_link() {
        let id = Uuid::new_v4();
        assert_eq!(linked_driver(&driver_user(Some(id))).unwrap(), id);
        assert!(matches!(linked_driver(&driver_user(None)), Err(AppError::Forbidden)));
    }
}
