// src/models/invoices.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn status_flow(&self) -> &'static [InvoiceStatus] {
        match self {
            InvoiceStatus::Draft => &[InvoiceStatus::Issued, InvoiceStatus::Cancelled],
            InvoiceStatus::Issued => &[InvoiceStatus::Paid, InvoiceStatus::Cancelled],
            InvoiceStatus::Paid | InvoiceStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        self.status_flow().contains(&next)
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Szkic",
            InvoiceStatus::Issued => "Wystawiona",
            InvoiceStatus::Paid => "Opłacona",
            InvoiceStatus::Cancelled => "Anulowana",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "FV/007/05/2024")]
    pub invoice_number: String,
    pub contractor_id: Uuid,
    pub order_id: Option<Uuid>,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub due_date: NaiveDate,
    #[schema(example = "PLN")]
    pub currency: String,
    #[schema(example = "4200.00")]
    pub total_net: Decimal,
    #[schema(example = "966.00")]
    pub total_vat: Decimal,
    #[schema(example = "5166.00")]
    pub total_gross: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Fatura emitida e não paga depois do vencimento.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Issued && self.due_date < today
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub invoice: Invoice,
    pub contractor_name: String,
    #[sqlx(skip)]
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub invoice_id: Uuid,
    pub position: i32,
    #[schema(example = "Usługa transportowa Poznań - Berlin")]
    pub description: String,
    #[schema(example = "1")]
    pub quantity: Decimal,
    #[schema(example = "usł.")]
    pub unit: String,
    #[schema(example = "4200.00")]
    pub unit_price_net: Decimal,
    #[schema(example = "23")]
    pub vat_rate: Decimal,
    pub net_amount: Decimal,
    pub vat_amount: Decimal,
    pub gross_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemInput {
    #[validate(length(min = 1, max = 500, message = "required"))]
    pub description: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub unit_price_net: Decimal,
    #[schema(example = "23")]
    pub vat_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInput {
    pub contractor_id: Uuid,
    pub order_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub sale_date: Option<NaiveDate>,
    /// Domyślnie: data wystawienia + termin płatności kontrahenta
    pub due_date: Option<NaiveDate>,
    #[validate(custom(function = "crate::common::validation::validate_currency"))]
    pub currency: Option<String>,
    pub notes: Option<String>,
    #[validate(nested)]
    pub items: Vec<InvoiceItemInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFromOrderInput {
    pub issue_date: Option<NaiveDate>,
    #[schema(example = "23")]
    pub vat_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatusInput {
    pub status: InvoiceStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InvoiceListQuery {
    pub status: Option<InvoiceStatus>,
    pub contractor_id: Option<Uuid>,
    /// Data wystawienia od (włącznie)
    pub date_from: Option<NaiveDate>,
    /// Data wystawienia do (włącznie)
    pub date_to: Option<NaiveDate>,
    /// Tylko przeterminowane
    pub overdue: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub contractor_name: String,
    pub is_overdue: bool,
    pub items: Vec<InvoiceItem>,
}

/// Linha já calculada (valores arredondados a 2 casas), pronta para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price_net: Decimal,
    pub vat_rate: Decimal,
    pub net_amount: Decimal,
    pub vat_amount: Decimal,
    pub gross_amount: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
}

/// Cabeçalho resolvido (datas e moeda já definidas).
#[derive(Debug, Clone)]
pub struct InvoiceHeader {
    pub contractor_id: Uuid,
    pub order_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_and_cancelled_are_final() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Issued));
        assert!(InvoiceStatus::Issued.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Cancelled));
        assert!(InvoiceStatus::Cancelled.status_flow().is_empty());
    }
}
