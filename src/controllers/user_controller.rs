use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::{
    CreateUserRequest, PasswordResetRequest, UpdateUserRequest, UserResponse,
};
use crate::dto::ApiResponse;
use crate::services::UserService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct UserController {
    users: UserService,
}

impl UserController {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
        }
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.users.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn create(&self, request: CreateUserRequest) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;
        let user = self.users.create(request).await?;
        Ok(ApiResponse::success_with_message(
            UserResponse::from(user),
            "Usuario creado exitosamente".to_string(),
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;
        let user = self.users.update(id, request).await?;
        Ok(ApiResponse::success_with_message(
            UserResponse::from(user),
            "Usuario actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.users.delete(id).await?;
        Ok(ApiResponse::message("Usuario eliminado exitosamente".to_string()))
    }

    pub async fn reset_password(&self, request: PasswordResetRequest) -> Result<ApiResponse<()>, AppError> {
        request.validate()?;
        self.users.send_password_reset(&request.email).await?;
        Ok(ApiResponse::message(format!(
            "Correo de restablecimiento enviado a {}",
            request.email.trim()
        )))
    }
}
