// src/models/drivers.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Piotr")]
    pub first_name: String,
    #[schema(example = "Nowak")]
    pub last_name: String,
    pub email: Option<String>,
    #[schema(example = "+48 600 100 200")]
    pub phone: Option<String>,
    #[schema(example = "00123/19/1465")]
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
    pub adr_certified: bool,
    pub adr_expiry: Option<NaiveDate>,
    pub medical_exam_expiry: Option<NaiveDate>,
    pub employed_since: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// Mesmo payload para criação e edição (formulário completo)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverInput {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub last_name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(min = 3, max = 50, message = "required"))]
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub adr_certified: bool,
    pub adr_expiry: Option<NaiveDate>,
    pub medical_exam_expiry: Option<NaiveDate>,
    pub employed_since: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DriverListQuery {
    /// Imię, nazwisko, e-mail lub numer prawa jazdy
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub adr_certified: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
