//! Network chat tiers.
//!
//! Each tier implements [`ChatAttempt`]; the router walks them in order.
//! Both network tiers share one `reqwest::Client` and bound every request
//! with the configured timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use daxcur_core::config::ChatConfig;
use daxcur_core::ModelType;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ChatError;
use crate::extract::{extract_content, match_shape};
use crate::types::{ChatMessage, Reply, Tier};

/// Longest upstream error body kept in [`ChatError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// One way of answering a chat request.
#[async_trait]
pub trait ChatAttempt: Send + Sync {
    /// Tier this attempt represents.
    fn tier(&self) -> Tier;

    /// Try to produce a non-empty assistant reply.
    async fn attempt(&self, model: ModelType, messages: &[ChatMessage]) -> Result<Reply, ChatError>;
}

/// POST `body` as JSON and decode the JSON reply.
///
/// Non-2xx statuses and undecodable bodies are errors.
pub(crate) async fn post_json(
    http: &Client,
    url: &str,
    body: &Value,
    timeout_ms: u64,
) -> Result<Value, ChatError> {
    let start = Instant::now();
    let resp = http
        .post(url)
        .json(body)
        .timeout(Duration::from_millis(timeout_ms))
        .send()
        .await
        .map_err(|e| with_timeout(e, timeout_ms))?;

    let status = resp.status();
    if !status.is_success() {
        let mut text = resp.text().await.unwrap_or_default();
        if text.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| text.is_char_boundary(*i))
                .unwrap_or(0);
            text.truncate(cut);
        }
        return Err(ChatError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    let bytes = resp.bytes().await.map_err(|e| with_timeout(e, timeout_ms))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| ChatError::Decode(e.to_string()))?;
    debug!(url, latency_ms = start.elapsed().as_millis(), "Upstream responded");
    Ok(value)
}

fn with_timeout(err: reqwest::Error, timeout_ms: u64) -> ChatError {
    match ChatError::from(err) {
        ChatError::Timeout(_) => ChatError::Timeout(timeout_ms),
        other => other,
    }
}

fn non_empty(content: String) -> Result<Reply, ChatError> {
    if content.trim().is_empty() {
        Err(ChatError::EmptyReply)
    } else {
        Ok(ChatMessage::assistant(content))
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Shared gateway: `POST {base}/api/v1/chat`.
#[derive(Debug, Clone)]
pub struct GatewayAttempt {
    http: Client,
    base_url: Option<String>,
    timeout_ms: u64,
}

impl GatewayAttempt {
    /// Create the gateway tier. `base_url` of `None` disables it.
    #[must_use]
    pub fn new(http: Client, base_url: Option<String>, timeout_ms: u64) -> Self {
        Self {
            http,
            base_url,
            timeout_ms,
        }
    }
}

#[async_trait]
impl ChatAttempt for GatewayAttempt {
    fn tier(&self) -> Tier {
        Tier::Gateway
    }

    async fn attempt(&self, model: ModelType, messages: &[ChatMessage]) -> Result<Reply, ChatError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(ChatError::NotConfigured(Tier::Gateway))?;
        let body = json!({
            "model_type": model,
            "messages": messages,
        });
        let value = post_json(&self.http, &join(base, "/api/v1/chat"), &body, self.timeout_ms).await?;

        // The gateway may also relay a raw model body.
        let (_, content) = match_shape(&value)
            .ok_or_else(|| ChatError::Decode(format!("unrecognised gateway reply: {value}")))?;
        non_empty(content)
    }
}

// ---------------------------------------------------------------------------
// Direct
// ---------------------------------------------------------------------------

/// Per-model-type endpoint: `POST {endpoint}/generate`.
#[derive(Debug, Clone)]
pub struct DirectAttempt {
    http: Client,
    config: ChatConfig,
}

impl DirectAttempt {
    /// Create the direct tier from the chat config's endpoint table.
    #[must_use]
    pub fn new(http: Client, config: ChatConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl ChatAttempt for DirectAttempt {
    fn tier(&self) -> Tier {
        Tier::Direct
    }

    async fn attempt(&self, model: ModelType, messages: &[ChatMessage]) -> Result<Reply, ChatError> {
        let base = self
            .config
            .endpoints
            .get(model)
            .ok_or(ChatError::NotConfigured(Tier::Direct))?;
        let body = json!({
            "model_type": model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });
        let value = post_json(
            &self.http,
            &join(base, "/generate"),
            &body,
            self.config.request_timeout_ms,
        )
        .await?;

        non_empty(extract_content(&value))
    }
}
