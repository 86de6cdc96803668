// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::common::i18n::DEFAULT_LANG;

const SUPPORTED: &[&str] = &["pl", "en"];

// Extrator de idioma (Accept-Language). Polonês quando não há correspondência.
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_str| {
                // "pl-PL" -> "pl"; a primeira tag suportada, por ordem de qualidade
                accept_language::parse(header_str)
                    .iter()
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
                    .find(|primary| SUPPORTED.contains(&primary.as_str()))
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn defaults_to_polish() {
        assert_eq!(Locale::from_headers(&HeaderMap::new()).0, "pl");
        assert_eq!(Locale::from_headers(&headers("de-DE")).0, "pl");
    }

    #[test]
    fn picks_supported_language() {
        assert_eq!(Locale::from_headers(&headers("en-US,en;q=0.9")).0, "en");
        assert_eq!(Locale::from_headers(&headers("fr;q=0.9, pl;q=0.8")).0, "pl");
    }
}
