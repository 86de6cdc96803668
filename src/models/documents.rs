// src/models/documents.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Cmr,
    Invoice,
    Insurance,
    License,
    Inspection,
    Contract,
    Photo,
    Other,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Cmr => "List przewozowy CMR",
            DocumentType::Invoice => "Faktura",
            DocumentType::Insurance => "Polisa",
            DocumentType::License => "Licencja / uprawnienia",
            DocumentType::Inspection => "Przegląd techniczny",
            DocumentType::Contract => "Umowa",
            DocumentType::Photo => "Zdjęcie",
            DocumentType::Other => "Inny",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(value.trim().to_uppercase())).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub document_type: DocumentType,
    #[schema(example = "Polisa OC 2024")]
    pub title: String,
    #[schema(example = "polisa_oc.pdf")]
    pub file_name: String,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub storage_path: String,
    pub order_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub expiry_date: Option<NaiveDate>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Metadados que acompanham o arquivo no formulário multipart.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpload {
    pub document_type: Option<DocumentType>,
    pub title: Option<String>,
    pub order_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub expiry_date: Option<NaiveDate>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DocumentListQuery {
    pub document_type: Option<DocumentType>,
    pub order_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    /// Tylko dokumenty wygasające w ciągu N dni (lub już wygasłe)
    pub expiring_within_days: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_case_insensitively() {
        assert_eq!(DocumentType::parse("cmr"), Some(DocumentType::Cmr));
        assert_eq!(DocumentType::parse(" Insurance "), Some(DocumentType::Insurance));
        assert_eq!(DocumentType::parse("passport"), None);
    }
}
