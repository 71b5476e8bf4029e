//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos de los formularios.

use chrono::NaiveDate;
use uuid::Uuid;
use validator::ValidationError;

/// Validar que un string no esté vacío (ignorando espacios)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar rol de usuario
pub fn validate_role(value: &str) -> Result<(), ValidationError> {
    match value {
        "admin" | "worker" => Ok(()),
        _ => {
            let mut error = ValidationError::new("role");
            error.add_param("value".into(), &value.to_string());
            error.add_param("allowed_values".into(), &"admin, worker".to_string());
            Err(error)
        }
    }
}

/// Validar y convertir string a fecha
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Recorta un texto opcional y descarta los vacíos
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Interpreta una referencia opcional a otro registro.
///
/// Cadenas vacías o ids mal formados equivalen a "sin referencia".
pub fn parse_optional_reference(value: Option<&str>) -> Option<Uuid> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| Uuid::parse_str(v).ok())
}
