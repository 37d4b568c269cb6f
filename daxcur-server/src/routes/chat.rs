use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use daxcur_core::ModelType;
use daxcur_llm::{ChatError, ChatMessage, CorrectionOutcome, Reply};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "modelType")]
    pub model_type: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: Reply,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectDaxRequest {
    #[serde(alias = "model_type")]
    pub model_type: String,
    #[serde(alias = "source_expression")]
    pub source_expression: String,
    #[serde(alias = "target_dax_formula")]
    pub target_dax_formula: String,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    let model: ModelType = req.model_type.parse()?;

    match state
        .chat
        .send_with_cancel(model, &req.messages, &state.shutdown)
        .await
    {
        Ok(routed) => Ok(Json(ChatResponse {
            reply: routed.reply,
        })),
        Err(ChatError::Cancelled) => Err(ApiError::Unavailable("Server is shutting down".into())),
        Err(e) => Err(ApiError::Internal(format!("Chat error: {e}"))),
    }
}

pub async fn correct_dax(
    State(state): State<AppState>,
    payload: Result<Json<CorrectDaxRequest>, JsonRejection>,
) -> Result<Json<CorrectionOutcome>, ApiError> {
    let Json(req) = payload?;
    let model: ModelType = req.model_type.parse()?;
    let outcome = state
        .corrector
        .correct_dax(model, &req.source_expression, &req.target_dax_formula)
        .await;
    Ok(Json(outcome))
}
