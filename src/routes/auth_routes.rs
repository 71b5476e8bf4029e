use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{LoginRequest, LoginResponse, SessionResponse};
use crate::dto::ApiResponse;
use crate::models::Session;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rutas públicas de autenticación
pub fn create_login_router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Rutas de autenticación que requieren sesión
pub fn create_session_router() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let controller = AuthController::new(&state);
    let response = controller.login(request).await?;
    Ok(Json(response))
}

async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Json<ApiResponse<()>> {
    let controller = AuthController::new(&state);
    Json(controller.logout(session).await)
}

async fn current_session(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Json<SessionResponse> {
    let controller = AuthController::new(&state);
    Json(controller.session(session))
}
