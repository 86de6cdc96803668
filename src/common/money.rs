// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Arredondamento comercial (0,005 -> 0,01), não o bancário padrão do `round_dp`.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// "1234.5" -> "1234,50" (separador decimal polonês)
pub fn format_pl(value: Decimal) -> String {
    format!("{:.2}", round2(value)).replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round2(d("0.125")), d("0.13"));
        assert_eq!(round2(d("2.345")), d("2.35"));
        assert_eq!(round2(d("-0.125")), d("-0.13"));
    }

    #[test]
    fn polish_format_uses_comma() {
        assert_eq!(format_pl(d("1234.5")), "1234,50");
        assert_eq!(format_pl(Decimal::ZERO), "0,00");
    }
}
