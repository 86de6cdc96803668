// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// 1. Cards de resumo (barra superior)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_orders: i64,
    pub orders_this_month: i64,
    pub revenue_this_month: Decimal,
    pub costs_this_month: Decimal,
    pub active_drivers: i64,
    pub active_vehicles: i64,
    pub active_trailers: i64,
    pub unpaid_invoices_total: Decimal,
    pub overdue_invoices: i64,
}

// 2. Gráfico: receitas x custos (últimos 12 meses)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyChartEntry {
    #[schema(example = "2024-05")]
    pub month: String,
    pub revenue: Decimal,
    pub costs: Decimal,
}

// 3. Alertas de vencimento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSource {
    Driver,
    Vehicle,
    Trailer,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    DriverLicense,
    Adr,
    MedicalExam,
    Insurance,
    Inspection,
    DocumentExpiry,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::DriverLicense => "Prawo jazdy",
            AlertKind::Adr => "Zaświadczenie ADR",
            AlertKind::MedicalExam => "Badania lekarskie",
            AlertKind::Insurance => "Ubezpieczenie",
            AlertKind::Inspection => "Przegląd techniczny",
            AlertKind::DocumentExpiry => "Ważność dokumentu",
        }
    }
}

/// Data de vencimento lida do banco, antes do filtro pelo limite.
#[derive(Debug, Clone)]
pub struct ExpiryCandidate {
    pub source: AlertSource,
    pub kind: AlertKind,
    pub entity_id: Uuid,
    pub entity_label: String,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryAlert {
    pub source: AlertSource,
    pub kind: AlertKind,
    #[schema(example = "Prawo jazdy")]
    pub label: String,
    pub entity_id: Uuid,
    #[schema(example = "Jan Kowalski")]
    pub entity_label: String,
    pub expiry_date: NaiveDate,
    /// Ujemne = termin już minął
    pub days_left: i64,
    pub expired: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AlertQuery {
    /// Próg w dniach (domyślnie 30)
    pub days: Option<i64>,
}
