// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_ORDER_PREFIX: &str = "ZL";
pub const DEFAULT_INVOICE_PREFIX: &str = "FV";
pub const DEFAULT_PAYMENT_TERM_DAYS: i32 = 14;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "Trans-Pol Sp. z o.o.")]
    pub company_name: Option<String>,

    #[schema(example = "5260001246")]
    pub nip: Option<String>,

    #[schema(example = "ul. Długa 5, 00-001 Warszawa")]
    pub address: Option<String>,

    pub phone: Option<String>,
    pub email: Option<String>,

    #[schema(example = "mBank")]
    pub bank_name: Option<String>,

    #[schema(example = "PL61 1090 1014 0000 0712 1981 2874")]
    pub bank_account: Option<String>,

    #[schema(example = "ZL")]
    pub order_prefix: String,

    #[schema(example = "FV")]
    pub invoice_prefix: String,

    #[schema(example = 14)]
    pub default_payment_term_days: i32,

    pub updated_at: Option<DateTime<Utc>>,
}

impl TenantSettings {
    /// Configuração "vazia" para empresas que ainda não salvaram o perfil.
    pub fn defaults(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            company_name: None,
            nip: None,
            address: None,
            phone: None,
            email: None,
            bank_name: None,
            bank_account: None,
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            invoice_prefix: DEFAULT_INVOICE_PREFIX.to_string(),
            default_payment_term_days: DEFAULT_PAYMENT_TERM_DAYS,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub company_name: Option<String>,
    #[validate(custom(function = "crate::common::validation::validate_nip"))]
    pub nip: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    #[validate(length(min = 1, max = 10, message = "too_long"))]
    pub order_prefix: Option<String>,
    #[validate(length(min = 1, max = 10, message = "too_long"))]
    pub invoice_prefix: Option<String>,
    #[validate(range(min = 0, max = 365, message = "out_of_range"))]
    pub default_payment_term_days: Option<i32>,
}
