//! Example repository: the business rules on top of an [`ExampleStore`].
//!
//! Every read-modify-write cycle runs under the model type's lock from
//! [`KeyedLocks`], so two concurrent adds against `cognos` are applied one
//! after the other while a `tableau` reset proceeds in parallel. Plain
//! reads go straight to the store.

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, info_span, Instrument};

use crate::error::{CurationError, Result};
use crate::locks::KeyedLocks;
use crate::metrics::{spans, CurationCounters, COUNTERS};
use crate::retention::apply_retention;
use crate::samples::{is_sample_id, sample_examples};
use crate::store::ExampleStore;
use crate::types::{BackupHandle, Example, ExampleListing, ModelType, NewExample, StoreHealth};

/// Default retention cap per model type.
pub const DEFAULT_MAX_EXAMPLES: usize = 10;

/// Curated example collections, one per [`ModelType`].
pub struct ExampleRepository {
    store: Arc<dyn ExampleStore>,
    max_examples: usize,
    locks: KeyedLocks<ModelType>,
}

impl std::fmt::Debug for ExampleRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExampleRepository")
            .field("max_examples", &self.max_examples)
            .finish_non_exhaustive()
    }
}

impl ExampleRepository {
    /// Wrap `store`, keeping at most `max_examples` records per model type.
    #[must_use]
    pub fn new(store: Arc<dyn ExampleStore>, max_examples: usize) -> Self {
        Self {
            store,
            max_examples: max_examples.max(1),
            locks: KeyedLocks::new(),
        }
    }

    /// The retention cap in effect.
    #[must_use]
    pub fn max_examples(&self) -> usize {
        self.max_examples
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ExampleStore> {
        &self.store
    }

    /// Stored examples, or the built-in samples when nothing is stored.
    ///
    /// # Errors
    /// Storage and corrupt-data errors propagate; they never fall back to
    /// samples.
    pub async fn list_examples(&self, model: ModelType) -> Result<ExampleListing> {
        let examples = self
            .store
            .load(model)
            .instrument(info_span!(spans::STORE_LOAD, model = %model))
            .await?;
        if examples.is_empty() {
            debug!(model = %model, "Collection empty, serving samples");
            return Ok(ExampleListing {
                examples: sample_examples(model),
                is_dummy_data: true,
            });
        }
        Ok(ExampleListing {
            examples,
            is_dummy_data: false,
        })
    }

    /// Append a user-supplied example, evicting the oldest past the cap.
    ///
    /// # Errors
    /// [`CurationError::Validation`] if either field is blank; storage
    /// errors from the load or save.
    pub async fn add_example(&self, model: ModelType, new: NewExample) -> Result<Example> {
        if new.source_expression.trim().is_empty() {
            return Err(CurationError::Validation(
                "sourceExpression must not be empty".to_string(),
            ));
        }
        if new.target_dax_formula.trim().is_empty() {
            return Err(CurationError::Validation(
                "targetDaxFormula must not be empty".to_string(),
            ));
        }

        self.append(model, new)
            .instrument(info_span!(spans::REPO_ADD, model = %model))
            .await
    }

    async fn append(&self, model: ModelType, new: NewExample) -> Result<Example> {
        let start = Instant::now();
        let _guard = self.locks.acquire(&model).await;

        let mut examples = self.store.load(model).await?;
        let now = Utc::now();
        let id = unique_id(model, now.timestamp_millis(), &examples);

        let example = Example {
            id: id.clone(),
            source_expression: new.source_expression,
            target_dax_formula: new.target_dax_formula,
            corrected_dax_formula: String::new(),
            previous_dax_formula: String::new(),
            confidence_score: None,
            is_user_added: true,
            created_at: Some(now),
            updated_at: None,
        };
        examples.push(example.clone());

        let retained = self.retain(model, examples);
        self.persist(model, &retained).await?;
        CurationCounters::bump(&COUNTERS.examples_added);
        info!(
            model = %model,
            id = %id,
            count = retained.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Example added"
        );
        Ok(example)
    }

    /// Replace an example's correction, keeping the previous value.
    ///
    /// If nothing is stored yet and `example_id` is one of the built-in
    /// samples, the sample set is persisted first so the placeholder the
    /// user was shown can be corrected.
    ///
    /// # Errors
    /// [`CurationError::NotFound`] if no example has `example_id`; storage
    /// errors from the load or save.
    pub async fn update_correction(
        &self,
        model: ModelType,
        example_id: &str,
        corrected: &str,
        confidence: Option<f64>,
    ) -> Result<Example> {
        self.correct(model, example_id, corrected, confidence)
            .instrument(info_span!(spans::REPO_CORRECT, model = %model, id = %example_id))
            .await
    }

    async fn correct(
        &self,
        model: ModelType,
        example_id: &str,
        corrected: &str,
        confidence: Option<f64>,
    ) -> Result<Example> {
        let _guard = self.locks.acquire(&model).await;

        let mut examples = self.store.load(model).await?;
        if examples.is_empty() && is_sample_id(model, example_id) {
            info!(model = %model, id = %example_id, "Materialising samples for correction");
            examples = sample_examples(model);
        }

        let example = examples
            .iter_mut()
            .find(|e| e.id == example_id)
            .ok_or_else(|| CurationError::NotFound {
                model_type: model,
                id: example_id.to_string(),
            })?;
        example.apply_correction(corrected, confidence);
        let updated = example.clone();

        let retained = self.retain(model, examples);
        self.persist(model, &retained).await?;
        CurationCounters::bump(&COUNTERS.corrections_applied);
        info!(
            model = %model,
            id = %example_id,
            had_previous = !updated.previous_dax_formula.is_empty(),
            "Correction applied"
        );
        Ok(updated)
    }

    /// Back up and remove a collection; listing then serves samples again.
    ///
    /// # Errors
    /// Storage errors from the backup or removal.
    pub async fn reset_examples(&self, model: ModelType) -> Result<BackupHandle> {
        let _guard = self.locks.acquire(&model).await;
        let backup = self.store.clear(model).await?;
        CurationCounters::bump(&COUNTERS.resets);
        info!(model = %model, backup = %backup.file_name, "Collection reset");
        Ok(backup)
    }

    /// Backups for `model`, newest first.
    ///
    /// # Errors
    /// Storage errors from the listing.
    pub async fn list_backups(&self, model: ModelType) -> Result<Vec<BackupHandle>> {
        self.store.list_backups(model).await
    }

    /// Examples held in one backup.
    ///
    /// # Errors
    /// Validation, not-found and storage errors from the store.
    pub async fn read_backup(&self, model: ModelType, file_name: &str) -> Result<Vec<Example>> {
        self.store.read_backup(model, file_name).await
    }

    /// Storage health.
    pub async fn health_check(&self) -> StoreHealth {
        self.store.health().await
    }

    /// Persist the sample set if the collection is empty.
    ///
    /// Returns the number of records written, 0 if already populated.
    ///
    /// # Errors
    /// Storage errors from the load or save.
    pub async fn seed(&self, model: ModelType) -> Result<usize> {
        let _guard = self.locks.acquire(&model).await;
        if !self.store.load(model).await?.is_empty() {
            debug!(model = %model, "Already populated, not seeding");
            return Ok(0);
        }
        let samples = self.retain(model, sample_examples(model));
        self.persist(model, &samples).await?;
        info!(model = %model, count = samples.len(), "Seeded sample examples");
        Ok(samples.len())
    }

    async fn persist(&self, model: ModelType, examples: &[Example]) -> Result<BackupHandle> {
        self.store
            .save(model, examples)
            .instrument(info_span!(spans::STORE_SAVE, model = %model, count = examples.len()))
            .await
    }

    /// Apply the retention cap ahead of a save, counting and logging evictions.
    fn retain(&self, model: ModelType, examples: Vec<Example>) -> Vec<Example> {
        let outcome = apply_retention(examples, self.max_examples);
        if !outcome.evicted.is_empty() {
            COUNTERS
                .examples_evicted
                .fetch_add(outcome.evicted.len() as u64, Ordering::Relaxed);
            info!(
                model = %model,
                evicted = ?outcome.evicted,
                cap = self.max_examples,
                "Retention cap reached, evicted oldest examples"
            );
        }
        outcome.retained
    }
}

/// `{model}-{ms}`, bumping the millisecond value past any id in use.
fn unique_id(model: ModelType, mut millis: i64, existing: &[Example]) -> String {
    let taken: HashSet<&str> = existing.iter().map(|e| e.id.as_str()).collect();
    loop {
        let candidate = format!("{model}-{millis}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn repo() -> (Arc<MemoryStore>, ExampleRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = ExampleRepository::new(store.clone(), DEFAULT_MAX_EXAMPLES);
        (store, repo)
    }

    #[test]
    fn unique_id_bumps_past_collisions() {
        let existing = vec![
            Example::seed("cognos-100", "a", "b"),
            Example::seed("cognos-101", "a", "b"),
        ];
        assert_eq!(unique_id(ModelType::Cognos, 100, &existing), "cognos-102");
        assert_eq!(unique_id(ModelType::Tableau, 100, &existing), "tableau-100");
    }

    #[tokio::test]
    async fn empty_collection_lists_samples() {
        let (_, repo) = repo();
        let listing = repo.list_examples(ModelType::Cognos).await.expect("list");
        assert!(listing.is_dummy_data);
        assert_eq!(listing.examples, sample_examples(ModelType::Cognos));
    }

    #[tokio::test]
    async fn corrupt_collection_does_not_fall_back() {
        let (store, repo) = repo();
        store.put_raw(ModelType::Cognos, "{{{");
        let err = repo.list_examples(ModelType::Cognos).await.expect_err("corrupt");
        assert!(matches!(err, CurationError::CorruptData { .. }));
    }

    #[tokio::test]
    async fn add_rejects_blank_fields() {
        let (store, repo) = repo();
        let err = repo
            .add_example(ModelType::Cognos, NewExample::new("   ", "SUM([x])"))
            .await
            .expect_err("blank source");
        assert!(matches!(err, CurationError::Validation(_)));
        let err = repo
            .add_example(ModelType::Cognos, NewExample::new("x", ""))
            .await
            .expect_err("blank target");
        assert!(matches!(err, CurationError::Validation(_)));
        assert!(store.list_backups(ModelType::Cognos).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn add_stores_input_verbatim() {
        let (_, repo) = repo();
        let added = repo
            .add_example(ModelType::Tableau, NewExample::new("  SUM([Sales]) ", "SUM(Orders[Sales])"))
            .await
            .expect("add");
        assert_eq!(added.source_expression, "  SUM([Sales]) ");
        assert!(added.is_user_added);
        assert!(added.id.starts_with("tableau-"));
        assert!(added.created_at.is_some());
    }

    #[tokio::test]
    async fn rapid_adds_get_distinct_ids() {
        let (_, repo) = repo();
        let mut ids = HashSet::new();
        for i in 0..5 {
            let ex = repo
                .add_example(ModelType::Cognos, NewExample::new(format!("s{i}"), "d"))
                .await
                .expect("add");
            assert!(ids.insert(ex.id));
        }
    }

    #[tokio::test]
    async fn retention_evicts_oldest() {
        let store = Arc::new(MemoryStore::new());
        let repo = ExampleRepository::new(store, 3);
        let mut first_id = String::new();
        for i in 0..4 {
            let ex = repo
                .add_example(ModelType::Cognos, NewExample::new(format!("s{i}"), "d"))
                .await
                .expect("add");
            if i == 0 {
                first_id = ex.id;
            }
        }
        let listing = repo.list_examples(ModelType::Cognos).await.expect("list");
        assert_eq!(listing.examples.len(), 3);
        assert!(listing.examples.iter().all(|e| e.id != first_id));
        assert_eq!(listing.examples[2].source_expression, "s3");
    }

    #[tokio::test]
    async fn correcting_unknown_id_is_not_found() {
        let (_, repo) = repo();
        repo.add_example(ModelType::Cognos, NewExample::new("s", "d"))
            .await
            .expect("add");
        let err = repo
            .update_correction(ModelType::Cognos, "cognos-0", "X", None)
            .await
            .expect_err("missing");
        assert!(matches!(err, CurationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn correcting_a_sample_materialises_the_set() {
        let (_, repo) = repo();
        let updated = repo
            .update_correction(ModelType::Microstrategy, "mstr-002", "DIVIDE([R], [U])", Some(0.9))
            .await
            .expect("correct sample");
        assert_eq!(updated.corrected_dax_formula, "DIVIDE([R], [U])");
        assert_eq!(updated.confidence_score, Some(0.9));

        let listing = repo.list_examples(ModelType::Microstrategy).await.expect("list");
        assert!(!listing.is_dummy_data);
        assert_eq!(listing.examples.len(), 3);
    }

    #[tokio::test]
    async fn empty_correction_clears() {
        let (_, repo) = repo();
        let ex = repo
            .add_example(ModelType::Cognos, NewExample::new("s", "d"))
            .await
            .expect("add");
        repo.update_correction(ModelType::Cognos, &ex.id, "A", None)
            .await
            .expect("A");
        let cleared = repo
            .update_correction(ModelType::Cognos, &ex.id, "", None)
            .await
            .expect("clear");
        assert_eq!(cleared.corrected_dax_formula, "");
        assert_eq!(cleared.previous_dax_formula, "A");
    }

    #[tokio::test]
    async fn failed_save_reports_error_and_keeps_data() {
        let (store, repo) = repo();
        repo.add_example(ModelType::Cognos, NewExample::new("s", "d"))
            .await
            .expect("add");
        store.set_fail_writes(true);
        let err = repo
            .add_example(ModelType::Cognos, NewExample::new("t", "d"))
            .await
            .expect_err("storage down");
        assert!(matches!(err, CurationError::StorageUnavailable { .. }));

        store.set_fail_writes(false);
        let listing = repo.list_examples(ModelType::Cognos).await.expect("list");
        assert_eq!(listing.examples.len(), 1);
    }

    #[tokio::test]
    async fn seed_only_fills_empty_collections() {
        let (_, repo) = repo();
        assert_eq!(repo.seed(ModelType::Tableau).await.expect("seed"), 3);
        assert_eq!(repo.seed(ModelType::Tableau).await.expect("seed again"), 0);
        let listing = repo.list_examples(ModelType::Tableau).await.expect("list");
        assert!(!listing.is_dummy_data);
    }

    #[tokio::test]
    async fn correction_trims_an_oversized_collection() {
        let store = Arc::new(MemoryStore::new());
        let legacy: Vec<Example> = (0..12)
            .map(|i| Example::seed(format!("e{i}"), "src", "dax"))
            .collect();
        store.put_raw(
            ModelType::Cognos,
            serde_json::to_vec(&legacy).expect("encode"),
        );
        let repo = ExampleRepository::new(store.clone(), 10);

        repo.update_correction(ModelType::Cognos, "e5", "X", None)
            .await
            .expect("correct");

        let stored = store.load(ModelType::Cognos).await.expect("load");
        assert_eq!(stored.len(), 10);
        assert_eq!(stored[0].id, "e2");
        assert_eq!(stored[9].id, "e11");
        let corrected = stored.iter().find(|e| e.id == "e5").expect("e5 kept");
        assert_eq!(corrected.corrected_dax_formula, "X");
    }

    #[tokio::test]
    async fn seed_respects_a_small_cap() {
        let store = Arc::new(MemoryStore::new());
        let repo = ExampleRepository::new(store.clone(), 2);
        assert_eq!(repo.seed(ModelType::Cognos).await.expect("seed"), 2);
        assert_eq!(store.load(ModelType::Cognos).await.expect("load").len(), 2);
    }
}
