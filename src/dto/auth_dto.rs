use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::auth::SESSION_STORAGE_KEY;
use crate::models::{AuthMethod, Session, SessionFlag};
use crate::services::auth_service::LoginOutcome;

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// Login response: token de sesión más la marca persistida
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub storage_key: &'static str,
    pub session: SessionFlag,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.token,
            expires_at: outcome.session.expires_at,
            storage_key: SESSION_STORAGE_KEY,
            session: outcome.flag,
        }
    }
}

// Sesión actual
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub email: String,
    pub method: AuthMethod,
    pub flag: SessionFlag,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            flag: session.flag(),
            email: session.email,
            method: session.method,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}
