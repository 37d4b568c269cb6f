//! Chat request/response types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The person curating formulas.
    User,
    /// The model.
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

impl ChatMessage {
    /// A user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A system turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// An assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The text returned for a conversation. Same shape as [`ChatMessage`].
pub type Reply = ChatMessage;

/// Which tier answered a chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Shared gateway in front of all models.
    Gateway,
    /// Per-model-type endpoint.
    Direct,
    /// Built-in keyword responder.
    Mock,
}

impl Tier {
    /// Lowercase name used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Direct => "direct",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reply together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedReply {
    /// Assistant reply.
    pub reply: Reply,
    /// Tier that answered.
    pub tier: Tier,
}

/// Result of a structured correction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionOutcome {
    /// Suggested formula; the original target when `success` is false.
    pub corrected_formula: String,
    /// Human-readable explanation.
    pub explanation: String,
    /// Confidence in [0, 1]; 0 when `success` is false.
    pub confidence_score: f64,
    /// Whether the correction service answered.
    pub success: bool,
}

impl CorrectionOutcome {
    /// Outcome for a failed call: echoes the input formula with zero confidence.
    #[must_use]
    pub fn failed(target_dax_formula: &str, explanation: impl Into<String>) -> Self {
        Self {
            corrected_formula: target_dax_formula.to_string(),
            explanation: explanation.into(),
            confidence_score: 0.0,
            success: false,
        }
    }
}
