//! # DAXCUR Core Library
//!
//! Persistence and domain rules for curated DAX conversion examples.
//!
//! Each supported migration path ([`ModelType`]) owns one small collection
//! of [`Example`] records:
//!
//! - **Store**: one JSON array per model type, written atomically, with a
//!   timestamped backup taken before every write ([`store`])
//! - **Retention**: collections are capped (default 10), oldest first out
//!   ([`retention`])
//! - **Repository**: add / correct / reset with per-model-type write
//!   serialisation ([`repository`])
//! - **Samples**: placeholder examples shown while a collection is empty
//!   ([`samples`])
//!
//! ## Layout on disk
//!
//! ```text
//! {data_dir}/cognos-examples.json
//! {data_dir}/microstrategy-examples.json
//! {backup_dir}/cognos-examples-20250114_093012.481.json
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod locks;
pub mod metrics;
pub mod repository;
pub mod retention;
pub mod samples;
pub mod store;
pub mod types;

pub use config::CurationConfig;
pub use error::CurationError;
pub use repository::ExampleRepository;
pub use store::{ExampleStore, FileStore, MemoryStore};
pub use types::*;
