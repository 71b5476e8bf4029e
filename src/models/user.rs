//! Modelo de UserProfile
//!
//! Mapea la tabla `users`: perfiles de acceso al panel con su rol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

labeled_enum! {
    /// Roles del sistema
    UserRole {
        Admin => "admin",
        Worker => "worker",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Worker
    }
}

/// Perfil de usuario
///
/// `local_password` es la contraseña de respaldo en texto plano que se usa
/// cuando el proveedor de identidad no responde o la cuenta no tiene
/// credencial allí. Nunca se expone en las respuestas de la API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub auth_uid: Option<String>,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub local_password: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Verifica la contraseña local de respaldo.
    ///
    /// Una contraseña vacía (guardada o recibida) nunca coincide.
    pub fn local_password_matches(&self, password: &str) -> bool {
        match self.local_password.as_deref() {
            Some(stored) if !stored.is_empty() && !password.is_empty() => stored == password,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(role: &str, local_password: Option<&str>) -> UserProfile {
        serde_json::from_value(json!({
            "id": Uuid::new_v4().to_string(),
            "email": "admin@valpotec.cl",
            "role": role,
            "local_password": local_password,
            "created_at": "2024-08-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_role_defaults_to_worker() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": Uuid::new_v4().to_string(),
            "email": "w@valpotec.cl",
            "created_at": "2024-08-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.role, UserRole::Worker);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_local_password_matches() {
        let user = profile("admin", Some("secreto"));
        assert!(user.is_admin());
        assert!(user.local_password_matches("secreto"));
        assert!(!user.local_password_matches("otro"));
        assert!(!user.local_password_matches(""));

        let empty = profile("admin", Some(""));
        assert!(!empty.local_password_matches(""));
        assert!(!profile("admin", None).local_password_matches("x"));
    }
}
