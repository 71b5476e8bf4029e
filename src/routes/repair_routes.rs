use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::repair_controller::RepairController;
use crate::dto::repair_dto::{
    AddPartLineRequest, AddServiceLineRequest, RepairListQuery, RepairPayload, RepairResponse,
    TotalsRequest,
};
use crate::dto::ApiResponse;
use crate::models::Totals;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_repair_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_repairs).post(create_repair))
        .route("/draft", get(draft_repair))
        .route("/totals", post(preview_totals))
        .route("/:id", get(get_repair).put(update_repair).delete(delete_repair))
        .route("/:id/document", get(repair_document))
        .route("/:id/services", post(add_service))
        .route("/:id/services/:line_id", delete(remove_service))
        .route("/:id/parts", post(add_part))
        .route("/:id/parts/:line_id", delete(remove_part))
}

async fn list_repairs(
    State(state): State<AppState>,
    Query(query): Query<RepairListQuery>,
) -> Result<Json<Vec<RepairResponse>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn draft_repair(State(state): State<AppState>) -> Json<RepairResponse> {
    let controller = RepairController::new(&state);
    Json(controller.draft())
}

async fn preview_totals(
    State(state): State<AppState>,
    Json(request): Json<TotalsRequest>,
) -> Json<Totals> {
    let controller = RepairController::new(&state);
    Json(controller.totals(request))
}

async fn get_repair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RepairResponse>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn create_repair(
    State(state): State<AppState>,
    Json(payload): Json<RepairPayload>,
) -> Result<Json<ApiResponse<RepairResponse>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.create(payload).await?))
}

async fn update_repair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RepairPayload>,
) -> Result<Json<ApiResponse<RepairResponse>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.update(id, payload).await?))
}

async fn delete_repair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.delete(id).await?))
}

async fn repair_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Html(controller.document(id).await?))
}

async fn add_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddServiceLineRequest>,
) -> Result<Json<ApiResponse<RepairResponse>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.add_service(id, request).await?))
}

async fn remove_service(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<RepairResponse>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.remove_service(id, &line_id).await?))
}

async fn add_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddPartLineRequest>,
) -> Result<Json<ApiResponse<RepairResponse>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.add_part(id, request).await?))
}

async fn remove_part(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<RepairResponse>>, AppError> {
    let controller = RepairController::new(&state);
    Ok(Json(controller.remove_part(id, &line_id).await?))
}
