use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{UserProfile, UserRole};
use crate::utils::validation::{validate_not_blank, validate_role};

// Request para crear un usuario
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    /// Contraseña para crear la cuenta en el proveedor de identidad
    #[validate(length(min = 6, max = 100))]
    pub password: Option<String>,
    pub local_password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(custom = "validate_role")]
    pub role: Option<String>,
}

// Request para actualizar un usuario
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(custom = "validate_role")]
    pub role: Option<String>,
    /// Vacía borra la contraseña local
    pub local_password: Option<String>,
}

// Request para enviar el correo de restablecimiento
#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(custom = "validate_not_blank")]
    pub email: String,
}

// Response de usuario, sin la contraseña local
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub auth_uid: Option<String>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub has_local_password: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            has_local_password: user
                .local_password
                .as_deref()
                .map_or(false, |pw| !pw.is_empty()),
            id: user.id,
            auth_uid: user.auth_uid,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
