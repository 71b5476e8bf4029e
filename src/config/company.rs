//! Datos de la empresa para el membrete de los documentos

use chrono::{FixedOffset, Offset, Utc};
use std::env;

pub const DEFAULT_COMPANY_NAME: &str = "Valpotec";
pub const DEFAULT_COMPANY_ADDRESS: &str = "Av. Valparaíso 694 Of. 112-C - Viña del Mar";
pub const DEFAULT_COMPANY_EMAIL: &str = "servicios@valpotec.cl";
pub const DEFAULT_COMPANY_LOGO_URL: &str = "https://valpotec.cl/wp-content/uploads/2024/07/LOGO.png";
pub const DEFAULT_DOCUMENT_SIGNATURE: &str =
    "Atte.\nVíctor Sanhueza Puentes\nCentro Autorizado DELL V Región";
/// Hora estándar de Chile continental, en segundos
pub const DEFAULT_UTC_OFFSET_SECS: i32 = -4 * 3600;

/// Desfase como `-04:00`, `+05:30` o en horas enteras (`-3`)
pub fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    if !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub address: String,
    pub email: String,
    pub logo_url: String,
    /// Bloque de firma; los saltos de línea se respetan al imprimir
    pub signature: String,
    /// Zona en que se muestran las fechas del documento
    pub utc_offset: FixedOffset,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMPANY_NAME.to_string(),
            address: DEFAULT_COMPANY_ADDRESS.to_string(),
            email: DEFAULT_COMPANY_EMAIL.to_string(),
            logo_url: DEFAULT_COMPANY_LOGO_URL.to_string(),
            signature: DEFAULT_DOCUMENT_SIGNATURE.to_string(),
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl CompanyProfile {
    /// Lee `COMPANY_*`, `DOCUMENT_SIGNATURE` y `DOCUMENT_UTC_OFFSET`; lo ausente toma el valor por defecto
    pub fn from_env() -> Self {
        Self::from_lookup(&|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            name: var("COMPANY_NAME").unwrap_or(defaults.name),
            address: var("COMPANY_ADDRESS").unwrap_or(defaults.address),
            email: var("COMPANY_EMAIL").unwrap_or(defaults.email),
            logo_url: var("COMPANY_LOGO_URL").unwrap_or(defaults.logo_url),
            signature: var("DOCUMENT_SIGNATURE")
                .map(|s| s.replace("\\n", "\n"))
                .unwrap_or(defaults.signature),
            utc_offset: var("DOCUMENT_UTC_OFFSET")
                .and_then(|v| parse_utc_offset(&v))
                .unwrap_or(defaults.utc_offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_line_breaks_are_unescaped() {
        let profile = CompanyProfile::from_lookup(&|name| match name {
            "DOCUMENT_SIGNATURE" => Some("Atte.\\nServicio Técnico".to_string()),
            "COMPANY_NAME" => Some(" ".to_string()),
            _ => None,
        });
        assert_eq!(profile.signature, "Atte.\nServicio Técnico");
        assert_eq!(profile.name, DEFAULT_COMPANY_NAME);
        assert_eq!(profile.utc_offset.local_minus_utc(), DEFAULT_UTC_OFFSET_SECS);
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("-03:00").map(|o| o.local_minus_utc()), Some(-3 * 3600));
        assert_eq!(parse_utc_offset("+05:30").map(|o| o.local_minus_utc()), Some(5 * 3600 + 1800));
        assert_eq!(parse_utc_offset("0").map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(parse_utc_offset("-4").map(|o| o.local_minus_utc()), Some(-4 * 3600));
        assert!(parse_utc_offset("Santiago").is_none());
        assert!(parse_utc_offset("+03:75").is_none());
        assert!(parse_utc_offset("99").is_none());
    }

    #[test]
    fn test_offset_from_environment() {
        let profile = CompanyProfile::from_lookup(&|name| match name {
            "DOCUMENT_UTC_OFFSET" => Some("-03:00".to_string()),
            _ => None,
        });
        assert_eq!(profile.utc_offset.local_minus_utc(), -3 * 3600);

        let profile = CompanyProfile::from_lookup(&|name| match name {
            "DOCUMENT_UTC_OFFSET" => Some("cualquiera".to_string()),
            _ => None,
        });
        assert_eq!(profile.utc_offset.local_minus_utc(), DEFAULT_UTC_OFFSET_SECS);
    }
}
