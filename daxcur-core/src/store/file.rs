//! JSON-file implementation of [`ExampleStore`].
//!
//! ```text
//! {data_dir}/{model}-examples.json                      live collection
//! {data_dir}/.{model}-examples.json.{pid}.{n}.tmp       in-flight write
//! {backup_dir}/{model}-examples-{stamp}[-{seq}].json    snapshots
//! ```
//!
//! Writes go to a temp file in the data directory, are fsynced, then
//! renamed over the live file, so readers see either the old or the new
//! collection and never a truncated one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, info_span, warn, Instrument};

use super::{
    backup_file_name, check_backup_name, collection_file_name, decode_examples, encode_examples,
    parse_backup_name, sort_newest_first, ExampleStore,
};
use crate::config::StorageConfig;
use crate::error::{CurationError, Result};
use crate::metrics::{spans, CurationCounters, COUNTERS};
use crate::types::{BackupHandle, Example, ModelType, StoreHealth};

/// Content written to a backup when no collection file exists yet.
const EMPTY_COLLECTION: &[u8] = b"[]";

/// Upper bound on same-millisecond backup collisions before giving up.
const MAX_BACKUP_SEQUENCE: u32 = 1000;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Stores each collection as a pretty-printed JSON array on local disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
    backup_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directories. Nothing is touched
    /// on disk until the first write.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Create a store from the `[storage]` config section.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.data_dir, &config.backup_dir)
    }

    /// Create the data and backup directories if they are missing.
    ///
    /// # Errors
    /// Returns [`CurationError::StorageUnavailable`] if either cannot be created.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.data_dir, &self.backup_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| CurationError::storage(dir, e))?;
        }
        Ok(())
    }

    /// Path of a model type's live collection file.
    #[must_use]
    pub fn collection_path(&self, model: ModelType) -> PathBuf {
        self.data_dir.join(collection_file_name(model))
    }

    /// Collection directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Backup directory.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Bytes of the live collection, or `[]` if it was never written.
    async fn current_bytes(&self, model: ModelType) -> Result<Vec<u8>> {
        let path = self.collection_path(model);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(EMPTY_COLLECTION.to_vec()),
            Err(e) => Err(CurationError::storage(path, e)),
        }
    }

    /// Create a backup file that did not exist before, bumping the sequence
    /// on name collisions.
    async fn create_backup_file(
        &self,
        model: ModelType,
        at: DateTime<Utc>,
    ) -> Result<(fs::File, PathBuf, String, u32)> {
        for sequence in 0..MAX_BACKUP_SEQUENCE {
            let name = backup_file_name(model, at, sequence);
            let path = self.backup_dir.join(&name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file, path, name, sequence)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(CurationError::storage(path, e)),
            }
        }
        Err(CurationError::storage(
            &self.backup_dir,
            std::io::Error::new(
                ErrorKind::AlreadyExists,
                format!("more than {MAX_BACKUP_SEQUENCE} backups share timestamp {at}"),
            ),
        ))
    }

    /// Write `bytes` to the live file via temp-file-then-rename.
    async fn write_atomic(&self, model: ModelType, bytes: &[u8]) -> Result<()> {
        let target = self.collection_path(model);
        let tmp = self.data_dir.join(format!(
            ".{}.{}.{}.tmp",
            collection_file_name(model),
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let written = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &target).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(CurationError::storage(target, e));
        }
        Ok(())
    }
}

#[async_trait]
impl ExampleStore for FileStore {
    async fn load(&self, model: ModelType) -> Result<Vec<Example>> {
        let path = self.collection_path(model);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(model = %model, "No collection file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(CurationError::storage(path, e)),
        };
        let examples = decode_examples(&path, &bytes)?;
        debug!(model = %model, count = examples.len(), bytes = bytes.len(), "Loaded collection");
        Ok(examples)
    }

    async fn backup(&self, model: ModelType) -> Result<BackupHandle> {
        let start = Instant::now();
        fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(|e| CurationError::storage(&self.backup_dir, e))?;

        let content = self.current_bytes(model).await?;
        let at = Utc::now().trunc_subsecs(3);
        let (mut file, path, file_name, sequence) = self.create_backup_file(model, at).await?;

        let flushed = async {
            file.write_all(&content).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = flushed {
            // Drop the partial snapshot.
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Failed to remove partial backup");
            }
            return Err(CurationError::storage(path, e));
        }

        CurationCounters::bump(&COUNTERS.backups_created);
        info!(
            model = %model,
            backup = %file_name,
            bytes = content.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Backup created"
        );

        Ok(BackupHandle {
            file_name,
            model_type: model,
            created_at: at,
            size_bytes: content.len() as u64,
            sequence,
            path,
        })
    }

    async fn save(&self, model: ModelType, examples: &[Example]) -> Result<BackupHandle> {
        let start = Instant::now();
        let bytes = encode_examples(examples)?;

        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| CurationError::storage(&self.data_dir, e))?;

        // Backup first; the live file is untouched if it fails.
        let backup = self
            .backup(model)
            .instrument(info_span!(spans::STORE_BACKUP, model = %model))
            .await?;
        self.write_atomic(model, &bytes).await?;

        CurationCounters::bump(&COUNTERS.saves_completed);
        debug!(
            model = %model,
            count = examples.len(),
            bytes = bytes.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved collection"
        );
        Ok(backup)
    }

    async fn clear(&self, model: ModelType) -> Result<BackupHandle> {
        let backup = self
            .backup(model)
            .instrument(info_span!(spans::STORE_BACKUP, model = %model))
            .await?;
        let path = self.collection_path(model);
        match fs::remove_file(&path).await {
            Ok(()) => info!(model = %model, "Collection removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(model = %model, "Collection already absent");
            }
            Err(e) => return Err(CurationError::storage(path, e)),
        }
        Ok(backup)
    }

    async fn list_backups(&self, model: ModelType) -> Result<Vec<BackupHandle>> {
        let mut entries = match fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CurationError::storage(&self.backup_dir, e)),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CurationError::storage(&self.backup_dir, e))?
        {
            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Some((created_at, sequence)) = parse_backup_name(model, &file_name) else {
                continue;
            };
            let size_bytes = match entry.metadata().await {
                Ok(meta) => meta.len(),
                Err(e) => {
                    warn!(backup = %file_name, error = %e, "Skipping unreadable backup");
                    continue;
                }
            };
            backups.push(BackupHandle {
                file_name,
                model_type: model,
                created_at,
                size_bytes,
                sequence,
                path: entry.path(),
            });
        }

        sort_newest_first(&mut backups);
        Ok(backups)
    }

    async fn read_backup(&self, model: ModelType, file_name: &str) -> Result<Vec<Example>> {
        check_backup_name(model, file_name)?;
        let path = self.backup_dir.join(file_name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CurationError::NotFound {
                    model_type: model,
                    id: file_name.to_string(),
                });
            }
            Err(e) => return Err(CurationError::storage(path, e)),
        };
        decode_examples(&path, &bytes)
    }

    async fn health(&self) -> StoreHealth {
        let exists = fs::metadata(&self.data_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let writable = if exists {
            let probe = self.data_dir.join(format!(
                ".daxcur-probe.{}.{}",
                std::process::id(),
                TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
            ));
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&probe)
                .await
            {
                Ok(file) => {
                    drop(file);
                    if let Err(e) = fs::remove_file(&probe).await {
                        warn!(path = %probe.display(), error = %e, "Failed to remove health probe");
                    }
                    true
                }
                Err(e) => {
                    warn!(dir = %self.data_dir.display(), error = %e, "Data directory not writable");
                    false
                }
            }
        } else {
            false
        };

        StoreHealth {
            ok: exists && writable,
            writable,
            data_dir: self.data_dir.clone(),
            backup_dir: self.backup_dir.clone(),
        }
    }
}
