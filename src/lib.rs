//! Valpotec - panel administrativo de órdenes de reparación
//!
//! Backend HTTP/JSON: clientes, órdenes de reparación con sus líneas y
//! totales, documento imprimible, resumen del panel, usuarios, vocabularios
//! y respaldo en planilla.

pub mod clients;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

/// Router completo de la aplicación
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes::create_api_router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Endpoint de verificación simple
async fn health_check() -> Json<Value> {
    Json(json!({
        "service": "valpotec-admin",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
