//! # daxcur-llm: chat routing for DAX curation
//!
//! Every conversational request for a model type goes through the
//! [`ChatRouter`], which tries each configured upstream in order and ends
//! with a local responder that cannot fail:
//!
//! ```text
//! Tier 1: Gateway          POST {gateway}/api/v1/chat        [optional]
//! Tier 2: Direct endpoint  POST {endpoints[model]}/generate  [optional]
//! Tier 3: Mock             keyword match on the latest user turn
//! ```
//!
//! A failing tier (timeout, transport error, non-2xx, undecodable or empty
//! body) falls through to the next one immediately, with no retries.
//!
//! [`DaxCorrector`] is a separate single-shot call to the per-model
//! `/dax/correct` endpoint and is not part of the fallback chain.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod attempt;
pub mod correct;
pub mod error;
pub mod extract;
pub mod mock;
pub mod router;
pub mod types;

pub use correct::DaxCorrector;
pub use error::ChatError;
pub use router::ChatRouter;
pub use types::{ChatMessage, CorrectionOutcome, Reply, Role, RoutedReply, Tier};
