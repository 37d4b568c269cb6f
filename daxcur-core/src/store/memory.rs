//! In-process [`ExampleStore`] for tests and ephemeral servers.
//!
//! Collections are kept as their encoded bytes so backups and corrupt-data
//! behaviour match the file store exactly.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::{
    backup_file_name, check_backup_name, collection_file_name, decode_examples, encode_examples,
    sort_newest_first, ExampleStore,
};
use crate::error::{CurationError, Result};
use crate::metrics::{CurationCounters, COUNTERS};
use crate::types::{BackupHandle, Example, ModelType, StoreHealth};

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<ModelType, Vec<u8>>,
    /// Keyed by file name; values are the handle and the snapshot bytes.
    backups: BTreeMap<String, (BackupHandle, Vec<u8>)>,
}

/// Heap-backed store with optional write-failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent backup (and therefore every save and clear)
    /// fail with [`CurationError::StorageUnavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Overwrite a collection's raw bytes without taking a backup.
    pub fn put_raw(&self, model: ModelType, bytes: impl Into<Vec<u8>>) {
        self.inner.lock().collections.insert(model, bytes.into());
    }

    fn pseudo_path(model: ModelType) -> PathBuf {
        Path::new("memory").join(collection_file_name(model))
    }

    fn check_writable(&self, model: ModelType) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CurationError::storage(
                Self::pseudo_path(model),
                std::io::Error::other("write failure injected"),
            ));
        }
        Ok(())
    }

    fn backup_locked(inner: &mut Inner, model: ModelType) -> BackupHandle {
        let content = inner
            .collections
            .get(&model)
            .cloned()
            .unwrap_or_else(|| b"[]".to_vec());
        let at = Utc::now().trunc_subsecs(3);

        let mut sequence = 0;
        let mut file_name = backup_file_name(model, at, sequence);
        while inner.backups.contains_key(&file_name) {
            sequence += 1;
            file_name = backup_file_name(model, at, sequence);
        }

        let handle = BackupHandle {
            file_name: file_name.clone(),
            model_type: model,
            created_at: at,
            size_bytes: content.len() as u64,
            sequence,
            path: PathBuf::new(),
        };
        inner.backups.insert(file_name, (handle.clone(), content));
        CurationCounters::bump(&COUNTERS.backups_created);
        handle
    }
}

#[async_trait]
impl ExampleStore for MemoryStore {
    async fn load(&self, model: ModelType) -> Result<Vec<Example>> {
        let inner = self.inner.lock();
        match inner.collections.get(&model) {
            Some(bytes) => decode_examples(&Self::pseudo_path(model), bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn backup(&self, model: ModelType) -> Result<BackupHandle> {
        self.check_writable(model)?;
        Ok(Self::backup_locked(&mut self.inner.lock(), model))
    }

    async fn save(&self, model: ModelType, examples: &[Example]) -> Result<BackupHandle> {
        let bytes = encode_examples(examples)?;
        self.check_writable(model)?;

        let mut inner = self.inner.lock();
        let backup = Self::backup_locked(&mut inner, model);
        inner.collections.insert(model, bytes);
        CurationCounters::bump(&COUNTERS.saves_completed);
        debug!(model = %model, count = examples.len(), "Saved collection (memory)");
        Ok(backup)
    }

    async fn clear(&self, model: ModelType) -> Result<BackupHandle> {
        self.check_writable(model)?;
        let mut inner = self.inner.lock();
        let backup = Self::backup_locked(&mut inner, model);
        inner.collections.remove(&model);
        Ok(backup)
    }

    async fn list_backups(&self, model: ModelType) -> Result<Vec<BackupHandle>> {
        let mut backups: Vec<BackupHandle> = self
            .inner
            .lock()
            .backups
            .values()
            .filter(|(h, _)| h.model_type == model)
            .map(|(h, _)| h.clone())
            .collect();
        sort_newest_first(&mut backups);
        Ok(backups)
    }

    async fn read_backup(&self, model: ModelType, file_name: &str) -> Result<Vec<Example>> {
        check_backup_name(model, file_name)?;
        let inner = self.inner.lock();
        let (_, bytes) = inner
            .backups
            .get(file_name)
            .ok_or_else(|| CurationError::NotFound {
                model_type: model,
                id: file_name.to_string(),
            })?;
        decode_examples(Path::new(file_name), bytes)
    }

    async fn health(&self) -> StoreHealth {
        let writable = !self.fail_writes.load(Ordering::SeqCst);
        StoreHealth {
            ok: writable,
            writable,
            data_dir: PathBuf::from("memory"),
            backup_dir: PathBuf::from("memory"),
        }
    }
}
