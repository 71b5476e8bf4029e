//! Configuración de variables de entorno
//! 
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{Context, Result};
use std::env;

use super::company::CompanyProfile;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// Sin `DATABASE_URL` se usa el almacén en memoria
    pub database_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub jwt_secret: String,
    pub session_hours: i64,
    pub cors_origins: Vec<String>,
    pub company: CompanyProfile,
}

fn non_empty(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EnvironmentConfig {
    /// Lee la configuración del proceso
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|name| env::var(name).ok())
    }

    /// Lee la configuración desde cualquier fuente de variables
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match non_empty(lookup, "PORT") {
            Some(port) => port.parse().context("PORT must be a valid number")?,
            None => 3000,
        };
        let session_hours = match non_empty(lookup, "SESSION_HOURS") {
            Some(hours) => hours.parse().context("SESSION_HOURS must be a valid number")?,
            None => 12,
        };

        Ok(Self {
            environment: non_empty(lookup, "ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port,
            host: non_empty(lookup, "HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            database_url: non_empty(lookup, "DATABASE_URL"),
            supabase_url: non_empty(lookup, "SUPABASE_URL"),
            supabase_anon_key: non_empty(lookup, "SUPABASE_ANON_KEY"),
            jwt_secret: non_empty(lookup, "JWT_SECRET")
                .unwrap_or_else(|| "valpotec-dev-secret".to_string()),
            session_hours,
            cors_origins: non_empty(lookup, "CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            company: CompanyProfile::from_lookup(lookup),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Credenciales del proveedor de identidad, si están completas
    pub fn identity_provider(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}
