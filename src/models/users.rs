// src/models/users.rs

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::UserRole;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "dyspozytor@firma.pl")]
    pub email: String,
    #[validate(length(min = 8, message = "password_too_short"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub last_name: String,
    pub role: UserRole,
    /// Wymagane dla roli DRIVER
    pub driver_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub last_name: String,
    pub role: UserRole,
    pub driver_id: Option<Uuid>,
    pub is_active: Option<bool>,
}
