// src/handlers.rs

pub mod auth;
pub mod contractors;
pub mod costs;
pub mod dashboard;
pub mod documents;
pub mod drivers;
pub mod fleet;
pub mod invoices;
pub mod mobile;
pub mod notes;
pub mod orders;
pub mod settings;
pub mod transfer;
pub mod users;

use axum::{
    extract::multipart::{Multipart, MultipartError},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::documents::{DocumentType, DocumentUpload},
};

/// Resposta de download com `Content-Disposition: attachment`.
pub(crate) fn attachment(file_name: &str, content_type: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name.replace('"', ""))),
        ],
        body,
    )
        .into_response()
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::InvalidInput("file_too_large")
    } else {
        tracing::debug!("Multipart inválido: {}", e.body_text());
        AppError::InvalidInput("multipart")
    }
}

fn optional_uuid(raw: &str) -> Result<Option<Uuid>, AppError> {
    match raw.trim() {
        "" => Ok(None),
        value => Uuid::parse_str(value).map(Some).map_err(|_| AppError::InvalidInput("invalid_field")),
    }
}

fn optional_date(raw: &str) -> Result<Option<NaiveDate>, AppError> {
    match raw.trim() {
        "" => Ok(None),
        value => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::InvalidInput("invalid_field")),
    }
}

/// Lê o formulário de upload: o campo `file` e os metadados do documento.
pub(crate) async fn read_document_upload(mut multipart: Multipart) -> Result<DocumentUpload, AppError> {
    let mut upload = DocumentUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            upload.file_name = field.file_name().map(str::to_string);
            upload.content_type = field.content_type().map(str::to_string);
            upload.data = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "documentType" => {
                upload.document_type = match value.trim() {
                    "" => None,
                    raw => Some(DocumentType::parse(raw).ok_or(AppError::InvalidInput("invalid_field"))?),
                }
            }
            "title" => upload.title = Some(value).filter(|v| !v.trim().is_empty()),
            "orderId" => upload.order_id = optional_uuid(&value)?,
            "driverId" => upload.driver_id = optional_uuid(&value)?,
            "vehicleId" => upload.vehicle_id = optional_uuid(&value)?,
            "trailerId" => upload.trailer_id = optional_uuid(&value)?,
            "expiryDate" => upload.expiry_date = optional_date(&value)?,
            _ => {}
        }
    }

    Ok(upload)
}

/// Só o conteúdo do campo `file` (import CSV).
pub(crate) async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            return Ok(field.bytes().await.map_err(multipart_error)?.to_vec());
        }
    }
    Err(AppError::InvalidInput("file_required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_form_values_are_none() {
        assert_eq!(optional_uuid("  ").unwrap(), None);
        assert_eq!(optional_date("").unwrap(), None);
        assert!(optional_uuid("abc").is_err());
        assert_eq!(optional_date("2025-01-31").unwrap(), NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn attachment_sets_download_headers() {
        let response = attachment("costs_20240507.csv", "text/csv; charset=utf-8", b"a;b".to_vec());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"costs_20240507.csv\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    }
}
