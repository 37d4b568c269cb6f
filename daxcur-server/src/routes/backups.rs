use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use daxcur_core::{BackupHandle, Example, ModelType};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BackupList {
    pub backups: Vec<BackupHandle>,
}

#[derive(Serialize)]
pub struct BackupContent {
    pub examples: Vec<Example>,
}

pub async fn list_backups(
    State(state): State<AppState>,
    Path(model_type): Path<String>,
) -> Result<Json<BackupList>, ApiError> {
    let model: ModelType = model_type.parse()?;
    let backups = state.repo.list_backups(model).await?;
    Ok(Json(BackupList { backups }))
}

pub async fn get_backup(
    State(state): State<AppState>,
    Path((model_type, file_name)): Path<(String, String)>,
) -> Result<Json<BackupContent>, ApiError> {
    let model: ModelType = model_type.parse()?;
    let examples = state.repo.read_backup(model, &file_name).await?;
    Ok(Json(BackupContent { examples }))
}
