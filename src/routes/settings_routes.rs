use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::state::AppState;
use crate::utils::errors::AppError;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn create_settings_router() -> Router<AppState> {
    Router::new().route("/backup", get(download_backup))
}

/// Descarga la planilla de respaldo como adjunto
async fn download_backup(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let backup = state.export.backup().await?;
    let disposition = format!("attachment; filename=\"{}\"", backup.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        backup.bytes,
    ))
}
