use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use daxcur_core::{Example, ExampleListing, ModelType, NewExample};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExampleRequest {
    #[serde(alias = "model_type")]
    pub model_type: String,
    pub example: NewExample,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCorrectionRequest {
    #[serde(alias = "model_type")]
    pub model_type: String,
    pub example_id: String,
    pub corrected_dax_formula: String,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Example>,
}

pub async fn list_examples(
    State(state): State<AppState>,
    Path(model_type): Path<String>,
) -> Result<Json<ExampleListing>, ApiError> {
    let model: ModelType = model_type.parse()?;
    let listing = state.repo.list_examples(model).await?;
    Ok(Json(listing))
}

pub async fn add_example(
    State(state): State<AppState>,
    payload: Result<Json<AddExampleRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = payload?;
    let model: ModelType = req.model_type.parse()?;
    let example = state.repo.add_example(model, req.example).await?;
    Ok(Json(ActionResponse {
        success: true,
        message: "Example added successfully".to_string(),
        example: Some(example),
    }))
}

pub async fn update_correction(
    State(state): State<AppState>,
    payload: Result<Json<UpdateCorrectionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(req) = payload?;
    let model: ModelType = req.model_type.parse()?;
    let example = state
        .repo
        .update_correction(
            model,
            &req.example_id,
            &req.corrected_dax_formula,
            req.confidence_score,
        )
        .await?;
    Ok(Json(ActionResponse {
        success: true,
        message: "Correction updated successfully".to_string(),
        example: Some(example),
    }))
}

pub async fn reset_examples(
    State(state): State<AppState>,
    Path(model_type): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    let model: ModelType = model_type.parse()?;
    state.repo.reset_examples(model).await?;
    Ok(Json(ActionResponse {
        success: true,
        message: format!("Reset {model} examples successfully"),
        example: None,
    }))
}
