//! Structured DAX correction against a model type's direct endpoint.
//!
//! One request, no fallback chain. Every failure is folded into a
//! [`CorrectionOutcome`] with `success = false` that echoes the input
//! formula, so callers never have to handle an error.

use std::time::Instant;

use daxcur_core::config::ChatConfig;
use daxcur_core::metrics::{spans, CurationCounters, COUNTERS};
use daxcur_core::{clamp_confidence, ModelType};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, info_span, warn, Instrument};

use crate::attempt::post_json;
use crate::error::ChatError;
use crate::types::{CorrectionOutcome, Tier};

/// Reply body of `/dax/correct`. camelCase keys are accepted too.
#[derive(Debug, Deserialize)]
struct CorrectionReply {
    #[serde(alias = "correctedFormula")]
    corrected_formula: String,
    #[serde(default)]
    explanation: String,
    #[serde(default, alias = "confidenceScore")]
    confidence_score: Option<f64>,
}

/// Client for `POST {endpoint}/dax/correct`.
#[derive(Debug, Clone)]
pub struct DaxCorrector {
    http: Client,
    config: ChatConfig,
}

impl DaxCorrector {
    /// Corrector using a fresh HTTP client.
    #[must_use]
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Corrector sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(http: Client, config: &ChatConfig) -> Self {
        Self {
            http,
            config: config.clone(),
        }
    }

    /// Ask the model type's endpoint to correct `target_dax_formula`.
    pub async fn correct_dax(
        &self,
        model: ModelType,
        source_expression: &str,
        target_dax_formula: &str,
    ) -> CorrectionOutcome {
        let start = Instant::now();
        match self
            .request(model, source_expression, target_dax_formula)
            .instrument(info_span!(spans::DAX_CORRECT, model = %model))
            .await
        {
            Ok(outcome) => {
                CurationCounters::bump(&COUNTERS.correction_calls_ok);
                info!(
                    model = %model,
                    confidence = outcome.confidence_score,
                    elapsed_ms = start.elapsed().as_millis(),
                    "DAX correction received"
                );
                outcome
            }
            Err(e) => {
                CurationCounters::bump(&COUNTERS.correction_calls_failed);
                warn!(model = %model, error = %e, "DAX correction failed");
                CorrectionOutcome::failed(
                    target_dax_formula,
                    format!("Correction service unavailable: {e}"),
                )
            }
        }
    }

    async fn request(
        &self,
        model: ModelType,
        source_expression: &str,
        target_dax_formula: &str,
    ) -> Result<CorrectionOutcome, ChatError> {
        let base = self
            .config
            .endpoints
            .get(model)
            .ok_or(ChatError::NotConfigured(Tier::Direct))?;
        let url = format!("{}/dax/correct", base.trim_end_matches('/'));
        let body = json!({
            "model_type": model,
            "source_expression": source_expression,
            "target_dax_formula": target_dax_formula,
        });

        let value = post_json(&self.http, &url, &body, self.config.request_timeout_ms).await?;
        let reply: CorrectionReply =
            serde_json::from_value(value).map_err(|e| ChatError::Decode(e.to_string()))?;

        Ok(CorrectionOutcome {
            corrected_formula: reply.corrected_formula,
            explanation: reply.explanation,
            confidence_score: reply
                .confidence_score
                .and_then(clamp_confidence)
                .unwrap_or(0.0),
            success: true,
        })
    }
}
