// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erro de domínio. Cada variante carrega apenas a chave de tradução;
// o texto final (polonês por padrão) é resolvido em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(&'static str),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    UserInactive,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(&'static str),

    #[error("Entidade com pedidos ativos: {0}")]
    HasActiveOrders(&'static str),

    #[error("Transição inválida de {from} para {to}")]
    InvalidStatusTransition { from: &'static str, to: &'static str },

    #[error("Conflito de estado: {0}")]
    StateConflict(&'static str),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de I/O: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro de CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Erro ao gerar PDF: {0}")]
    PdfError(#[from] genpdf::error::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserInactive | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::HasActiveOrders(_)
            | AppError::InvalidStatusTransition { .. }
            | AppError::StateConflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, já traduzida.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        let error = match self {
            AppError::ValidationError(errors) => {
                let translate = |e: &ValidationError| {
                    let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                    store.translate(lang, &format!("validation.{key}"))
                };
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                flatten_validation(errors, "", &translate, &mut details);
                return ApiError {
                    status,
                    error: store.translate(lang, "error.validation"),
                    details: Some(json!(details)),
                };
            }
            AppError::InvalidInput(key) => store.translate(lang, &format!("input.{key}")),
            AppError::InvalidCredentials => store.translate(lang, "error.invalid_credentials"),
            AppError::InvalidToken => store.translate(lang, "error.invalid_token"),
            AppError::UserInactive => store.translate(lang, "error.user_inactive"),
            AppError::Forbidden => store.translate(lang, "error.forbidden"),
            AppError::ResourceNotFound(entity) => {
                let entity = store.translate(lang, &format!("entity.{entity}"));
                store.format(lang, "error.not_found", &[("entity", entity.as_str())])
            }
            AppError::EmailAlreadyExists => store.translate(lang, "error.email_exists"),
            AppError::UniqueConstraintViolation(key) | AppError::StateConflict(key) => {
                store.translate(lang, &format!("conflict.{key}"))
            }
            AppError::HasActiveOrders(entity) => {
                let entity = store.translate(lang, &format!("entity.{entity}"));
                store.format(lang, "error.has_active_orders", &[("entity", entity.as_str())])
            }
            AppError::InvalidStatusTransition { from, to } => {
                store.format(lang, "error.invalid_status_transition", &[("from", *from), ("to", *to)])
            }
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                store.translate(lang, "error.internal")
            }
        };

        ApiError { status, error, details: None }
    }
}

// Itens aninhados viram "items[0].description"
fn flatten_validation(
    errors: &ValidationErrors,
    prefix: &str,
    translate: &impl Fn(&ValidationError) -> String,
    details: &mut HashMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() { field.to_string() } else { format!("{prefix}.{field}") };
        match kind {
            ValidationErrorsKind::Field(list) => {
                details.entry(path).or_default().extend(list.iter().map(translate));
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation(inner, &path, translate, details),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_validation(inner, &format!("{path}[{idx}]"), translate, details);
                }
            }
        }
    }
}

/// Resposta de erro da API: `{ "error": "...", "details": {...}? }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Traduz violações de UNIQUE (pelo nome da constraint) em erros de conflito.
pub(crate) fn map_unique_violation(
    e: sqlx::Error,
    resolve: impl FnOnce(&str) -> Option<AppError>,
) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(mapped) = resolve(db_err.constraint().unwrap_or_default()) {
                return mapped;
            }
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn store() -> I18nStore {
        I18nStore::new().expect("locales")
    }

    #[test]
    fn status_codes_follow_the_http_contract() {
        assert_eq!(AppError::InvalidInput("file_required").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::ResourceNotFound("driver").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UniqueConstraintViolation("driver_license").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::HasActiveOrders("vehicle").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_default_to_polish() {
        let err = AppError::ResourceNotFound("vehicle").to_api_error(&Locale("pl".into()), &store());
        assert_eq!(err.error, "Nie znaleziono: pojazd.");

        let err = AppError::HasActiveOrders("driver").to_api_error(&Locale("pl".into()), &store());
        assert!(err.error.contains("kierowca"));
    }

    #[test]
    fn english_is_used_when_requested() {
        let err = AppError::EmailAlreadyExists.to_api_error(&Locale("en".into()), &store());
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.error, "This e-mail is already in use.");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("connection refused"))
            .to_api_error(&Locale("pl".into()), &store());
        assert_eq!(err.error, "Wystąpił nieoczekiwany błąd.");
        assert!(err.details.is_none());
    }

    #[derive(Validate)]
    struct Contact {
        #[validate(email(message = "invalid_email"))]
        email: String,
    }

    #[derive(Validate)]
    struct Line {
        #[validate(length(min = 1, message = "required"))]
        description: String,
    }

    #[derive(Validate)]
    struct Bill {
        #[validate(length(equal = 2, message = "invalid_field"))]
        country: String,
        #[validate(nested)]
        items: Vec<Line>,
    }

    #[test]
    fn nested_item_errors_are_reported_with_their_index() {
        let bill = Bill {
            country: "POL".into(),
            items: vec![Line { description: "Fracht".into() }, Line { description: String::new() }],
        };
        let errors = bill.validate().unwrap_err();
        let err = AppError::ValidationError(errors).to_api_error(&Locale("pl".into()), &store());

        let details = err.details.expect("details");
        assert_eq!(details["items[1].description"][0], "Pole jest wymagane.");
        assert_eq!(details["country"][0], "Nieprawidłowa wartość pola.");
        assert!(details.get("items[0].description").is_none());
    }

    #[test]
    fn validation_errors_carry_translated_details() {
        let errors = Contact { email: "nope".into() }.validate().unwrap_err();
        let err = AppError::ValidationError(errors).to_api_error(&Locale("pl".into()), &store());

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let details = err.details.expect("details");
        assert_eq!(details["email"][0], "Nieprawidłowy adres e-mail.");
    }
}
