//! Rutas de la API
//!
//! Todo `/api/*` exige sesión salvo `POST /api/auth/login`.

pub mod auth_routes;
pub mod catalog_routes;
pub mod client_routes;
pub mod dashboard_routes;
pub mod repair_routes;
pub mod settings_routes;
pub mod user_routes;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::require_session;
use crate::state::AppState;

pub fn create_api_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth_routes::create_session_router())
        .nest("/clients", client_routes::create_client_router())
        .nest("/repairs", repair_routes::create_repair_router())
        .nest("/users", user_routes::create_user_router())
        .nest("/brands", catalog_routes::create_brand_router())
        .nest("/models", catalog_routes::create_model_router())
        .nest("/device-types", catalog_routes::create_device_type_router())
        .nest("/dashboard", dashboard_routes::create_dashboard_router())
        .nest("/settings", settings_routes::create_settings_router())
        .route_layer(from_fn_with_state(state, require_session));

    Router::new()
        .merge(auth_routes::create_login_router())
        .merge(protected)
}
