//! Three-tier chat router.
//!
//! The network tiers are an ordered list of [`ChatAttempt`]s folded with
//! short circuit: the first `Ok` wins and every error is logged and skipped.
//! [`MockResponder`] answers once every attempt has failed, so
//! [`ChatRouter::send`] always returns a reply.

use std::sync::Arc;
use std::time::Instant;

use daxcur_core::config::ChatConfig;
use daxcur_core::metrics::{spans, CurationCounters, COUNTERS};
use daxcur_core::ModelType;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::attempt::{ChatAttempt, DirectAttempt, GatewayAttempt};
use crate::error::ChatError;
use crate::mock::MockResponder;
use crate::types::{ChatMessage, RoutedReply, Tier};

/// Routes chat requests across gateway, direct endpoint and mock.
#[derive(Clone)]
pub struct ChatRouter {
    attempts: Vec<Arc<dyn ChatAttempt>>,
}

impl std::fmt::Debug for ChatRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tiers: Vec<Tier> = self.attempts.iter().map(|a| a.tier()).collect();
        f.debug_struct("ChatRouter").field("tiers", &tiers).finish()
    }
}

impl ChatRouter {
    /// Build the standard gateway → direct chain from config.
    #[must_use]
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Same as [`ChatRouter::from_config`] with a caller-supplied client.
    #[must_use]
    pub fn with_client(http: Client, config: &ChatConfig) -> Self {
        Self::new(vec![
            Arc::new(GatewayAttempt::new(
                http.clone(),
                config.gateway_url.clone(),
                config.request_timeout_ms,
            )),
            Arc::new(DirectAttempt::new(http, config.clone())),
        ])
    }

    /// Router over custom network attempts, tried in order before the mock.
    #[must_use]
    pub fn new(attempts: Vec<Arc<dyn ChatAttempt>>) -> Self {
        Self { attempts }
    }

    /// Router that answers from the mock only.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(Vec::new())
    }

    /// Reply to `messages`, falling through tiers until one answers.
    pub async fn send(&self, model: ModelType, messages: &[ChatMessage]) -> RoutedReply {
        self.route(model, messages)
            .instrument(info_span!(spans::CHAT_SEND, model = %model))
            .await
    }

    /// Like [`ChatRouter::send`], but abandons the in-flight attempt when
    /// `cancel` fires.
    ///
    /// # Errors
    /// [`ChatError::Cancelled`] if the token fires before a reply is ready.
    pub async fn send_with_cancel(
        &self,
        model: ModelType,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> Result<RoutedReply, ChatError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(model = %model, "Chat request cancelled");
                Err(ChatError::Cancelled)
            }
            routed = self.send(model, messages) => Ok(routed),
        }
    }

    async fn route(&self, model: ModelType, messages: &[ChatMessage]) -> RoutedReply {
        for attempt in &self.attempts {
            let tier = attempt.tier();
            let start = Instant::now();
            match attempt.attempt(model, messages).await {
                Ok(reply) => {
                    record(tier);
                    info!(
                        model = %model,
                        tier = %tier,
                        elapsed_ms = start.elapsed().as_millis(),
                        "Chat answered"
                    );
                    return RoutedReply { reply, tier };
                }
                Err(e) if e.is_not_configured() => {
                    debug!(model = %model, tier = %tier, "Tier not configured, skipping");
                }
                Err(e) => {
                    CurationCounters::bump(&COUNTERS.chat_fallthroughs);
                    warn!(
                        model = %model,
                        tier = %tier,
                        error = %e,
                        elapsed_ms = start.elapsed().as_millis(),
                        "Chat tier failed, falling through"
                    );
                }
            }
        }

        record(Tier::Mock);
        info!(model = %model, tier = %Tier::Mock, "Chat answered");
        RoutedReply {
            reply: MockResponder::respond(messages),
            tier: Tier::Mock,
        }
    }
}

fn record(tier: Tier) {
    let counter = match tier {
        Tier::Gateway => &COUNTERS.chat_gateway,
        Tier::Direct => &COUNTERS.chat_direct,
        Tier::Mock => &COUNTERS.chat_mock,
    };
    CurationCounters::bump(counter);
}
