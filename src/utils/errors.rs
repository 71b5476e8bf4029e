//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use sqlx::postgres::PgDatabaseError;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Falla reportada por el almacén de registros.
///
/// Conserva los campos que entrega el proveedor (código, detalle, pista)
/// y el mensaje fijo de la acción del usuario que falló.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreFailure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip)]
    pub action: Option<String>,
}

impl StoreFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data access error: {0}")]
    DataAccess(StoreFailure),

    #[error("Constraint violation: {0}")]
    Constraint(StoreFailure),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Asocia el mensaje fijo de la acción de usuario a un error del almacén.
    ///
    /// Los demás errores se devuelven sin cambios.
    pub fn during(self, action: &str) -> Self {
        match self {
            AppError::DataAccess(mut failure) => {
                failure.action = Some(action.to_string());
                AppError::DataAccess(failure)
            }
            AppError::Constraint(mut failure) => {
                failure.action = Some(action.to_string());
                AppError::Constraint(failure)
            }
            other => other,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                let (details, hint) = match db_err.try_downcast_ref::<PgDatabaseError>() {
                    Some(pg) => (
                        pg.detail().map(str::to_string),
                        pg.hint().map(str::to_string),
                    ),
                    None => (None, None),
                };
                let is_constraint = code.as_deref().map_or(false, |c| c.starts_with("23"));
                let failure = StoreFailure {
                    message: db_err.message().to_string(),
                    status: Some(if is_constraint { 409 } else { 400 }),
                    code,
                    details,
                    hint,
                    action: None,
                };
                if is_constraint {
                    AppError::Constraint(failure)
                } else {
                    AppError::DataAccess(failure)
                }
            }
            None => AppError::DataAccess(StoreFailure::new(e.to_string())),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("Error de serialización: {}", e))
    }
}

/// Respuesta de error para la API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::DataAccess(failure) => {
                error!("❌ Error de acceso a datos: {}", failure);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Data Access Error".to_string(),
                        message: failure
                            .action
                            .clone()
                            .unwrap_or_else(|| "Error accediendo a los datos".to_string()),
                        details: Some(json!(failure)),
                        code: Some("DATA_ACCESS_ERROR".to_string()),
                    },
                )
            }

            AppError::Constraint(failure) => {
                warn!("⚠️ Restricción violada: {}", failure);
                let message = match &failure.action {
                    Some(action) => format!("{}: {}", action, failure.message),
                    None => failure.message.clone(),
                };
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Constraint Violation".to_string(),
                        message,
                        details: Some(json!(failure)),
                        code: Some("CONSTRAINT_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                warn!("⚠️ Error de validación: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "Los datos enviados no son válidos".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Unauthorized(msg) => {
                warn!("⚠️ Acceso no autenticado: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Unauthorized".to_string(),
                        message: msg,
                        details: None,
                        code: Some("UNAUTHORIZED".to_string()),
                    },
                )
            }

            AppError::Forbidden(msg) => {
                warn!("⚠️ Acceso denegado: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: Some("NOT_FOUND".to_string()),
                },
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    code: Some("BAD_REQUEST".to_string()),
                },
            ),

            AppError::ExternalApi(msg) => {
                error!("❌ Error del proveedor externo: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "External API Error".to_string(),
                        message: "Error comunicando con el servicio externo".to_string(),
                        details: Some(json!({ "external_api_error": msg })),
                        code: Some("EXTERNAL_API_ERROR".to_string()),
                    },
                )
            }

            AppError::Render(e) => {
                error!("❌ Error generando documento: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Render Error".to_string(),
                        message: "Error generando el documento".to_string(),
                        details: Some(json!({ "render_error": e.to_string() })),
                        code: Some("RENDER_ERROR".to_string()),
                    },
                )
            }

            AppError::Export(e) => {
                error!("❌ Error creando backup: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Export Error".to_string(),
                        message: format!("Error creando backup: {}", e),
                        details: None,
                        code: Some("EXPORT_ERROR".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                error!("❌ Error interno: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "Ocurrió un error inesperado".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} con id '{}' no encontrado", resource, id))
}
