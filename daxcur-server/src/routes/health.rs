use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use daxcur_core::ModelType;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub writable: bool,
    pub timestamp: String,
    pub data_directory: String,
    pub backup_directory: String,
    pub available_models: Vec<ModelType>,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = state.repo.health_check().await;
    let (code, status) = if health.ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            writable: health.writable,
            timestamp: Utc::now().to_rfc3339(),
            data_directory: health.data_dir.display().to_string(),
            backup_directory: health.backup_dir.display().to_string(),
            available_models: ModelType::ALL.to_vec(),
        }),
    )
}
