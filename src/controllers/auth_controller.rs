use std::sync::Arc;
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse, SessionResponse};
use crate::dto::ApiResponse;
use crate::models::Session;
use crate::services::AuthService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct AuthController {
    auth: Arc<AuthService>,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            auth: state.auth.clone(),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<ApiResponse<LoginResponse>, AppError> {
        request.validate()?;
        let outcome = self.auth.login(&request.email, &request.password).await?;
        Ok(ApiResponse::success_with_message(
            LoginResponse::from(outcome),
            "Sesión iniciada".to_string(),
        ))
    }

    pub async fn logout(&self, session: Session) -> ApiResponse<()> {
        self.auth.logout(session.id).await;
        ApiResponse::message("Sesión cerrada".to_string())
    }

    pub fn session(&self, session: Session) -> SessionResponse {
        SessionResponse::from(session)
    }
}
