use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::catalog_controller::CatalogController;
use crate::dto::catalog_dto::{CreateCatalogItemRequest, CreateModelRequest, ModelResponse};
use crate::dto::ApiResponse;
use crate::models::{Brand, DeviceModel, DeviceType};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_brand_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/:id", delete(delete_brand))
}

pub fn create_model_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_models).post(create_model))
        .route("/:id", delete(delete_model))
}

pub fn create_device_type_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_device_types).post(create_device_type))
        .route("/:id", delete(delete_device_type))
}

async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>, AppError> {
    Ok(Json(CatalogController::new(&state).list_brands().await?))
}

async fn create_brand(
    State(state): State<AppState>,
    Json(request): Json<CreateCatalogItemRequest>,
) -> Result<Json<ApiResponse<Brand>>, AppError> {
    Ok(Json(CatalogController::new(&state).create_brand(request).await?))
}

async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    Ok(Json(CatalogController::new(&state).delete_brand(id).await?))
}

async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<ModelResponse>>, AppError> {
    Ok(Json(CatalogController::new(&state).list_models().await?))
}

async fn create_model(
    State(state): State<AppState>,
    Json(request): Json<CreateModelRequest>,
) -> Result<Json<ApiResponse<DeviceModel>>, AppError> {
    Ok(Json(CatalogController::new(&state).create_model(request).await?))
}

async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    Ok(Json(CatalogController::new(&state).delete_model(id).await?))
}

async fn list_device_types(State(state): State<AppState>) -> Result<Json<Vec<DeviceType>>, AppError> {
    Ok(Json(CatalogController::new(&state).list_device_types().await?))
}

async fn create_device_type(
    State(state): State<AppState>,
    Json(request): Json<CreateCatalogItemRequest>,
) -> Result<Json<ApiResponse<DeviceType>>, AppError> {
    Ok(Json(CatalogController::new(&state).create_device_type(request).await?))
}

async fn delete_device_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    Ok(Json(CatalogController::new(&state).delete_device_type(id).await?))
}
