//! Modelos de autenticación y sesión

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clave fija bajo la que se persiste la marca de sesión
pub const SESSION_STORAGE_KEY: &str = "crm_session";

/// Marca de método para sesiones abiertas con la contraseña local
pub const LOCAL_PASSWORD_METHOD: &str = "local-pass";

/// Usuario autenticado por el proveedor de identidad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

/// Cómo se abrió la sesión
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    Provider { user_id: String },
    LocalPassword,
}

/// Sesión activa del panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub email: String,
    pub method: AuthMethod,
    /// Token del proveedor, necesario para cerrar sesión allá
    #[serde(skip)]
    pub provider_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Forma persistida de la sesión (`crm_session`)
    pub fn flag(&self) -> SessionFlag {
        match &self.method {
            AuthMethod::Provider { user_id } => SessionFlag {
                user: self.email.clone(),
                uid: Some(user_id.clone()),
                method: None,
            },
            AuthMethod::LocalPassword => SessionFlag {
                user: self.email.clone(),
                uid: None,
                method: Some(LOCAL_PASSWORD_METHOD.to_string()),
            },
        }
    }
}

/// Marca de sesión: email más id del proveedor o `method: "local-pass"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFlag {
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Claims del JWT de sesión
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // session id
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn session(method: AuthMethod) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            email: "admin@valpotec.cl".to_string(),
            method,
            provider_token: Some("token".to_string()),
            created_at: now,
            expires_at: now + Duration::hours(1),
        }
    }

    #[test]
    fn test_flag_for_provider_session() {
        let flag = session(AuthMethod::Provider {
            user_id: "uid-1".to_string(),
        })
        .flag();
        assert_eq!(
            serde_json::to_value(flag).unwrap(),
            json!({ "user": "admin@valpotec.cl", "uid": "uid-1" })
        );
    }

    #[test]
    fn test_flag_for_local_password_session() {
        let flag = session(AuthMethod::LocalPassword).flag();
        assert_eq!(
            serde_json::to_value(flag).unwrap(),
            json!({ "user": "admin@valpotec.cl", "method": "local-pass" })
        );
    }

    #[test]
    fn test_provider_token_is_not_serialized() {
        let value = serde_json::to_value(session(AuthMethod::LocalPassword)).unwrap();
        assert!(value.get("provider_token").is_none());
        assert_eq!(value["method"]["type"], "local_password");
    }
}
