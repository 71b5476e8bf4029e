//! Montos y conversión tolerante de valores numéricos
//!
//! Los formularios de reparaciones envían montos como texto libre, números,
//! `null` o con nombres de campo antiguos. Nada de eso debe producir un
//! error: lo que no se puede interpretar vale cero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

/// Tasa de I.V.A. (19%)
pub const VAT_RATE: Decimal = Decimal::from_parts(19, 0, 0, false, 2);

/// Monto máximo aceptado por línea (10^15); lo que lo excede vale cero
pub const MAX_LINE_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Redondeo a 2 decimales, mitades lejos de cero
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Interpreta un texto como monto. `None` si no es un número.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn bounded(amount: Decimal) -> Decimal {
    if amount.abs() > MAX_LINE_AMOUNT {
        Decimal::ZERO
    } else {
        amount
    }
}

/// Convierte un valor JSON arbitrario en monto; lo no numérico o fuera de
/// rango vale cero.
pub fn coerce_amount(value: &Value) -> Decimal {
    let amount = match value {
        Value::Null => Decimal::ZERO,
        Value::Bool(true) => Decimal::ONE,
        Value::Bool(false) => Decimal::ZERO,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                parse_amount(&n.to_string()).unwrap_or(Decimal::ZERO)
            }
        }
        Value::String(s) => parse_amount(s).unwrap_or(Decimal::ZERO),
        Value::Array(_) | Value::Object(_) => Decimal::ZERO,
    };
    bounded(amount)
}

/// Monto de una línea: campo actual o, si está ausente, el campo antiguo.
pub fn line_amount(current: Option<&Value>, legacy: Option<&Value>) -> Decimal {
    match current {
        Some(value) => coerce_amount(value),
        None => legacy.map(coerce_amount).unwrap_or(Decimal::ZERO),
    }
}

/// Formato de montos como `es-CL`: `.` para miles, `,` para decimales,
/// hasta 3 decimales.
pub fn format_clp(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*digit);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(round_currency(dec("0.125")), dec("0.13"));
        assert_eq!(round_currency(dec("-0.125")), dec("-0.13"));
        assert_eq!(round_currency(dec("285")), dec("285.00"));
    }

    #[test]
    fn test_coerce_amount_tolerates_garbage() {
        assert_eq!(coerce_amount(&json!(1000)), dec("1000"));
        assert_eq!(coerce_amount(&json!(12.5)), dec("12.5"));
        assert_eq!(coerce_amount(&json!(" 300 ")), dec("300"));
        assert_eq!(coerce_amount(&json!("abc")), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!("")), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(null)), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!({ "x": 1 })), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!("1e3")), dec("1000"));
    }

    #[test]
    fn test_coerce_amount_out_of_range_is_zero() {
        assert_eq!(coerce_amount(&json!("79228162514264337593543950335")), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!("-7e28")), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(i64::MAX)), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!("1000000000000000")), MAX_LINE_AMOUNT);
        assert_eq!(line_amount(None, Some(&json!("1000000000000001"))), Decimal::ZERO);
    }

    #[test]
    fn test_line_amount_falls_back_to_legacy_only_when_absent() {
        assert_eq!(line_amount(None, Some(&json!("250"))), dec("250"));
        assert_eq!(line_amount(Some(&json!(0)), Some(&json!(250))), Decimal::ZERO);
        assert_eq!(line_amount(Some(&json!(null)), Some(&json!(250))), Decimal::ZERO);
        assert_eq!(line_amount(None, None), Decimal::ZERO);
    }

    #[test]
    fn test_format_clp() {
        assert_eq!(format_clp(dec("1785.00")), "1.785");
        assert_eq!(format_clp(dec("285")), "285");
        assert_eq!(format_clp(dec("1234567.5")), "1.234.567,5");
        assert_eq!(format_clp(dec("0")), "0");
        assert_eq!(format_clp(dec("-1500.25")), "-1.500,25");
        assert_eq!(format_clp(dec("10.12345")), "10,123");
    }
}
