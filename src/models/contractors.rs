// src/models/contractors.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contractor_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractorKind {
    Client,
    Carrier,
    Both,
}

impl ContractorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContractorKind::Client => "Klient",
            ContractorKind::Carrier => "Przewoźnik",
            ContractorKind::Both => "Klient i przewoźnik",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "CLIENT" | "KLIENT" => Some(ContractorKind::Client),
            "CARRIER" | "PRZEWOŹNIK" => Some(ContractorKind::Carrier),
            "BOTH" | "KLIENT I PRZEWOŹNIK" => Some(ContractorKind::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contractor {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Logistyka Nord S.A.")]
    pub name: String,
    pub kind: ContractorKind,
    #[schema(example = "5260001246")]
    pub nip: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    #[schema(example = "PL")]
    pub country: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = 30)]
    pub payment_term_days: i32,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractorInput {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub name: String,
    pub kind: ContractorKind,
    #[validate(custom(function = "crate::common::validation::validate_nip"))]
    pub nip: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    #[validate(length(equal = 2, message = "invalid_field"))]
    pub country: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(range(min = 0, max = 365, message = "out_of_range"))]
    pub payment_term_days: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContractorListQuery {
    /// Nazwa, NIP lub miasto
    pub search: Option<String>,
    pub kind: Option<ContractorKind>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
