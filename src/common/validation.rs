// src/common/validation.rs

use validator::ValidationError;

// Pesos oficiais do dígito de controle do NIP
const NIP_WEIGHTS: [u32; 9] = [6, 5, 7, 2, 3, 4, 5, 6, 7];

/// Valida um NIP polonês (10 dígitos, hífens e espaços são ignorados).
pub fn validate_nip(value: &str) -> Result<(), ValidationError> {
    let digits: Vec<u32> = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid_nip)?;

    if digits.len() != 10 {
        return Err(invalid_nip());
    }

    let checksum: u32 = NIP_WEIGHTS.iter().zip(&digits).map(|(w, d)| w * d).sum::<u32>() % 11;
    if checksum == 10 || checksum != digits[9] {
        return Err(invalid_nip());
    }
    Ok(())
}

pub fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency");
        err.message = Some("invalid_currency".into());
        Err(err)
    }
}

fn invalid_nip() -> ValidationError {
    let mut err = ValidationError::new("nip");
    err.message = Some("invalid_nip".into());
    err
}

/// "wx 12345" -> "WX12345"
pub fn normalize_registration(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

pub fn normalize_nip(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Strings vazias vindas de formulários viram `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_nip_with_separators() {
        assert!(validate_nip("526-000-12-46").is_ok());
        assert!(validate_nip("5260001246").is_ok());
    }

    #[test]
    fn rejects_bad_checksum_and_length() {
        assert!(validate_nip("5260001247").is_err());
        assert!(validate_nip("12345").is_err());
        assert!(validate_nip("52600012AB").is_err());
    }

    #[test]
    fn registration_is_normalized() {
        assert_eq!(normalize_registration(" wx 1234-5 "), "WX12345");
    }

    #[test]
    fn currency_must_be_three_letters() {
        assert!(validate_currency("PLN").is_ok());
        assert!(validate_currency("EURO").is_err());
        assert!(validate_currency("P1N").is_err());
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" a ".into())), Some("a".into()));
    }
}
