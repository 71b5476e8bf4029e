use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::models::DashboardSummary;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/", get(current_summary))
        .route("/refresh", post(refresh_summary))
}

async fn current_summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.dashboard.current().await?))
}

async fn refresh_summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.dashboard.refresh().await?))
}
