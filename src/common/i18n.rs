// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pl";

const LOCALES: &[(&str, &str)] = &[
    ("pl", include_str!("../../locales/pl.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Dicionário de mensagens carregado uma única vez no startup.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn new() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in LOCALES {
            let table: HashMap<String, String> = serde_json::from_str(raw)?;
            messages.insert(lang.to_string(), table);
        }
        Ok(Self { messages })
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.contains_key(lang)
    }

    /// Idioma pedido -> polonês -> a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    pub fn format(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.translate(lang, key);
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_polish_key_has_an_english_counterpart() {
        let store = I18nStore::new().unwrap();
        let pl = &store.messages["pl"];
        let en = &store.messages["en"];
        let missing: Vec<&String> = pl.keys().filter(|k| !en.contains_key(*k)).collect();
        assert!(missing.is_empty(), "brak tłumaczeń: {missing:?}");
    }

    #[test]
    fn unknown_language_falls_back_to_polish() {
        let store = I18nStore::new().unwrap();
        assert_eq!(store.translate("de", "entity.vehicle"), "pojazd");
    }

    #[test]
    fn unknown_key_is_returned_as_is() {
        let store = I18nStore::new().unwrap();
        assert_eq!(store.translate("pl", "no.such.key"), "no.such.key");
    }

    #[test]
    fn placeholders_are_substituted() {
        let store = I18nStore::new().unwrap();
        let text = store.format("en", "error.not_found", &[("entity", "order")]);
        assert_eq!(text, "Not found: order.");
    }
}
