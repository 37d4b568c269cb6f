//! Example persistence.
//!
//! [`ExampleStore`] is the storage seam the repository is built on. Every
//! implementation must uphold the same contract:
//!
//! - `save` and `clear` take a backup first and only then write; if the
//!   backup fails nothing is written.
//! - A reader never observes a half-written collection.
//! - Malformed data is reported as [`CurationError::CorruptData`], never
//!   replaced with an empty collection.
//!
//! [`FileStore`] is the production implementation; [`MemoryStore`] backs
//! tests and the server's ephemeral mode.

mod file;
mod memory;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{CurationError, Result};
use crate::types::{BackupHandle, Example, ModelType, StoreHealth};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Timestamp layout embedded in backup file names (UTC, millisecond resolution).
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S%.3f";

/// Second-resolution layout written by older deployments; still listed.
const LEGACY_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Durable storage for one example collection per model type.
#[async_trait]
pub trait ExampleStore: Send + Sync {
    /// Read the collection. A collection that was never written is empty.
    async fn load(&self, model: ModelType) -> Result<Vec<Example>>;

    /// Snapshot the current collection into a new, uniquely named backup.
    async fn backup(&self, model: ModelType) -> Result<BackupHandle>;

    /// Back up, then atomically replace the collection with `examples`.
    ///
    /// Returns the backup taken before the write.
    async fn save(&self, model: ModelType, examples: &[Example]) -> Result<BackupHandle>;

    /// Back up, then remove the collection entirely.
    async fn clear(&self, model: ModelType) -> Result<BackupHandle>;

    /// All backups for `model`, newest first.
    async fn list_backups(&self, model: ModelType) -> Result<Vec<BackupHandle>>;

    /// Read the examples held in one backup.
    async fn read_backup(&self, model: ModelType, file_name: &str) -> Result<Vec<Example>>;

    /// Probe the storage location without touching any collection.
    async fn health(&self) -> StoreHealth;
}

// ---------------------------------------------------------------------------
// Naming & encoding helpers shared by the implementations
// ---------------------------------------------------------------------------

/// File name of a model type's collection.
#[must_use]
pub fn collection_file_name(model: ModelType) -> String {
    format!("{model}-examples.json")
}

/// File name of a backup taken at `at`; `sequence > 0` disambiguates
/// snapshots sharing a timestamp.
#[must_use]
pub fn backup_file_name(model: ModelType, at: DateTime<Utc>, sequence: u32) -> String {
    let stamp = at.format(BACKUP_STAMP_FORMAT);
    if sequence == 0 {
        format!("{model}-examples-{stamp}.json")
    } else {
        format!("{model}-examples-{stamp}-{sequence}.json")
    }
}

/// Parse a backup file name belonging to `model`.
///
/// Returns the embedded timestamp and sequence, or `None` if the name is
/// not a backup of this model type.
#[must_use]
pub fn parse_backup_name(model: ModelType, file_name: &str) -> Option<(DateTime<Utc>, u32)> {
    let prefix = format!("{model}-examples-");
    let rest = file_name.strip_prefix(&prefix)?.strip_suffix(".json")?;

    let (stamp, sequence) = match rest.split_once('-') {
        Some((stamp, seq)) => (stamp, seq.parse::<u32>().ok()?),
        None => (rest, 0),
    };

    let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(stamp, LEGACY_STAMP_FORMAT))
        .ok()?;
    Some((naive.and_utc(), sequence))
}

/// Reject backup names that could escape the backup directory or belong to
/// another model type.
///
/// # Errors
/// Returns [`CurationError::Validation`] for any name that is not a backup
/// of `model`.
pub fn check_backup_name(model: ModelType, file_name: &str) -> Result<()> {
    let traversal = file_name.contains('/') || file_name.contains('\\') || file_name.contains("..");
    if traversal || parse_backup_name(model, file_name).is_none() {
        return Err(CurationError::Validation(format!(
            "'{file_name}' is not a {model} backup"
        )));
    }
    Ok(())
}

/// Serialise a collection the way it is stored on disk (2-space pretty JSON).
///
/// # Errors
/// Returns [`CurationError::Serialization`] if encoding fails.
pub fn encode_examples(examples: &[Example]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(examples).map_err(|e| CurationError::Serialization(e.to_string()))
}

/// Parse a stored collection.
///
/// # Errors
/// Returns [`CurationError::CorruptData`] naming `path` if the bytes are not
/// a JSON array of examples.
pub fn decode_examples(path: &Path, bytes: &[u8]) -> Result<Vec<Example>> {
    serde_json::from_slice(bytes).map_err(|e| CurationError::CorruptData {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Newest first; ties broken by sequence.
pub(crate) fn sort_newest_first(backups: &mut [BackupHandle]) {
    backups.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.sequence.cmp(&a.sequence))
    });
}
