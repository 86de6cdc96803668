// src/models/transfer.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xml,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xml => "application/xml; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    pub format: Option<ExportFormat>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Entidades aceitas pelo export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportEntity {
    Orders,
    Costs,
    Invoices,
    Drivers,
    Vehicles,
    Trailers,
    Contractors,
}

impl ExportEntity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "orders" => Some(ExportEntity::Orders),
            "costs" => Some(ExportEntity::Costs),
            "invoices" => Some(ExportEntity::Invoices),
            "drivers" => Some(ExportEntity::Drivers),
            "vehicles" => Some(ExportEntity::Vehicles),
            "trailers" => Some(ExportEntity::Trailers),
            "contractors" => Some(ExportEntity::Contractors),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportEntity::Orders => "orders",
            ExportEntity::Costs => "costs",
            ExportEntity::Invoices => "invoices",
            ExportEntity::Drivers => "drivers",
            ExportEntity::Vehicles => "vehicles",
            ExportEntity::Trailers => "trailers",
            ExportEntity::Contractors => "contractors",
        }
    }

    /// Nome do elemento XML de um registro.
    pub fn record_tag(&self) -> &'static str {
        match self {
            ExportEntity::Orders => "order",
            ExportEntity::Costs => "cost",
            ExportEntity::Invoices => "invoice",
            ExportEntity::Drivers => "driver",
            ExportEntity::Vehicles => "vehicle",
            ExportEntity::Trailers => "trailer",
            ExportEntity::Contractors => "contractor",
        }
    }
}

/// Entidades aceitas pelo import CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportEntity {
    Drivers,
    Vehicles,
    Trailers,
    Contractors,
}

impl ImportEntity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "drivers" => Some(ImportEntity::Drivers),
            "vehicles" => Some(ImportEntity::Vehicles),
            "trailers" => Some(ImportEntity::Trailers),
            "contractors" => Some(ImportEntity::Contractors),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    /// Numer wiersza w pliku (nagłówek = 1)
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_names_round_trip() {
        for name in ["orders", "costs", "invoices", "drivers", "vehicles", "trailers", "contractors"] {
            assert_eq!(ExportEntity::parse(name).map(|e| e.as_str()), Some(name));
        }
        assert!(ExportEntity::parse("users").is_none());
        assert!(ImportEntity::parse("orders").is_none());
    }

    #[test]
    fn format_defaults_to_csv() {
        let q: ExportQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(q.format.unwrap_or_default(), ExportFormat::Csv);
        let f: ExportFormat = serde_json::from_value(serde_json::json!("xml")).unwrap();
        assert_eq!(f.extension(), "xml");
    }
}
