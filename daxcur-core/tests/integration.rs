//! Integration tests: end-to-end curation flows against a real directory.
//!
//! Each test gets its own `tempfile` directory holding `data/` and
//! `backups/`, and drives the repository on top of a [`FileStore`].

use std::sync::Arc;

use daxcur_core::repository::ExampleRepository;
use daxcur_core::samples::sample_examples;
use daxcur_core::store::{ExampleStore, FileStore};
use daxcur_core::{CurationError, ModelType, NewExample};

fn setup(dir: &tempfile::TempDir, cap: usize) -> (Arc<FileStore>, ExampleRepository) {
    let store = Arc::new(FileStore::new(
        dir.path().join("data"),
        dir.path().join("backups"),
    ));
    let repo = ExampleRepository::new(store.clone(), cap);
    (store, repo)
}

// ---------------------------------------------------------------------------
// Add → correct → correct
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_then_correct_on_empty_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);

    let added = repo
        .add_example(ModelType::Cognos, NewExample::new("SUM(Revenue)", "SUM([Revenue])"))
        .await
        .expect("add");

    let listing = repo.list_examples(ModelType::Cognos).await.expect("list");
    assert!(!listing.is_dummy_data);
    assert_eq!(listing.examples.len(), 1);
    assert!(listing.examples[0].is_user_added);
    assert_eq!(listing.examples[0].corrected_dax_formula, "");

    let corrected = repo
        .update_correction(ModelType::Cognos, &added.id, "CALCULATE(SUM([Revenue]))", None)
        .await
        .expect("correct");
    assert_eq!(corrected.corrected_dax_formula, "CALCULATE(SUM([Revenue]))");
    assert_eq!(corrected.previous_dax_formula, "");
    assert_eq!(corrected.target_dax_formula, "SUM([Revenue])", "target never rewritten");
}

#[tokio::test]
async fn correction_history_is_one_level() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);
    let ex = repo
        .add_example(ModelType::Tableau, NewExample::new("SUM([Sales])", "SUM(Orders[Sales])"))
        .await
        .expect("add");

    for formula in ["A", "B"] {
        repo.update_correction(ModelType::Tableau, &ex.id, formula, None)
            .await
            .expect("correct");
    }
    let listing = repo.list_examples(ModelType::Tableau).await.expect("list");
    assert_eq!(listing.examples[0].previous_dax_formula, "A");
    assert_eq!(listing.examples[0].corrected_dax_formula, "B");

    repo.update_correction(ModelType::Tableau, &ex.id, "C", Some(0.8))
        .await
        .expect("correct");
    let listing = repo.list_examples(ModelType::Tableau).await.expect("list");
    assert_eq!(listing.examples[0].previous_dax_formula, "B");
    assert_eq!(listing.examples[0].confidence_score, Some(0.8));
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

#[tokio::test]
async fn eleventh_insert_evicts_the_oldest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);

    let mut ids = Vec::new();
    for i in 0..11 {
        let ex = repo
            .add_example(ModelType::Microstrategy, NewExample::new(format!("Sum(M{i})"), "SUM([M])"))
            .await
            .expect("add");
        ids.push(ex.id);
    }

    let listing = repo.list_examples(ModelType::Microstrategy).await.expect("list");
    assert_eq!(listing.examples.len(), 10);
    assert!(listing.examples.iter().all(|e| e.id != ids[0]), "oldest evicted");
    assert_eq!(listing.examples.last().map(|e| e.id.as_str()), Some(ids[10].as_str()));
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reads_are_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);
    repo.add_example(ModelType::Cognos, NewExample::new("a", "b"))
        .await
        .expect("add");

    let first = repo.list_examples(ModelType::Cognos).await.expect("list");
    let second = repo.list_examples(ModelType::Cognos).await.expect("list");
    assert_eq!(first, second);
}

#[tokio::test]
async fn collections_are_isolated_per_model_type() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);
    repo.add_example(ModelType::Cognos, NewExample::new("a", "b"))
        .await
        .expect("add");

    let tableau = repo.list_examples(ModelType::Tableau).await.expect("list");
    assert!(tableau.is_dummy_data);
    assert_eq!(tableau.examples, sample_examples(ModelType::Tableau));
}

#[tokio::test]
async fn corrupt_file_surfaces_as_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (store, repo) = setup(&dir, 10);
    store.ensure_dirs().await.expect("dirs");
    std::fs::write(store.collection_path(ModelType::Cognos), "[{\"id\":").expect("write");

    let err = repo.list_examples(ModelType::Cognos).await.expect_err("corrupt");
    assert!(matches!(err, CurationError::CorruptData { .. }));
    let err = repo
        .add_example(ModelType::Cognos, NewExample::new("a", "b"))
        .await
        .expect_err("corrupt blocks writes");
    assert!(matches!(err, CurationError::CorruptData { .. }));
}

// ---------------------------------------------------------------------------
// Reset & backups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reset_brings_back_samples() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);
    repo.add_example(ModelType::Tableau, NewExample::new("a", "b"))
        .await
        .expect("add");

    let backup = repo.reset_examples(ModelType::Tableau).await.expect("reset");
    let listing = repo.list_examples(ModelType::Tableau).await.expect("list");
    assert!(listing.is_dummy_data);
    assert_eq!(listing.examples, sample_examples(ModelType::Tableau));

    let snapshot = repo
        .read_backup(ModelType::Tableau, &backup.file_name)
        .await
        .expect("read backup");
    assert_eq!(snapshot.len(), 1, "reset snapshot holds the removed data");
}

#[tokio::test]
async fn every_save_adds_one_backup_of_pre_write_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (store, repo) = setup(&dir, 10);

    for i in 0..4 {
        let before = store.load(ModelType::Cognos).await.expect("load");
        let count_before = repo.list_backups(ModelType::Cognos).await.expect("list").len();

        repo.add_example(ModelType::Cognos, NewExample::new(format!("s{i}"), "d"))
            .await
            .expect("add");

        let backups = repo.list_backups(ModelType::Cognos).await.expect("list");
        assert_eq!(backups.len(), count_before + 1);
        let newest = repo
            .read_backup(ModelType::Cognos, &backups[0].file_name)
            .await
            .expect("read newest");
        assert_eq!(newest, before);
    }
}

#[tokio::test]
async fn backups_are_listed_newest_first_with_metadata() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);
    for i in 0..3 {
        repo.add_example(ModelType::Cognos, NewExample::new(format!("s{i}"), "d"))
            .await
            .expect("add");
    }
    let backups = repo.list_backups(ModelType::Cognos).await.expect("list");
    assert_eq!(backups.len(), 3);
    assert!(backups.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert!(backups.iter().all(|b| b.file_name.starts_with("cognos-examples-")));
    assert!(backups[0].size_bytes > backups[2].size_bytes);
}

#[tokio::test]
async fn failed_backup_leaves_collection_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (store, repo) = setup(&dir, 10);
    repo.add_example(ModelType::Cognos, NewExample::new("a", "b"))
        .await
        .expect("add");

    // A regular file where the backup directory should be.
    std::fs::remove_dir_all(dir.path().join("backups")).expect("rm backups");
    std::fs::write(dir.path().join("backups"), b"blocker").expect("write blocker");

    let err = repo
        .add_example(ModelType::Cognos, NewExample::new("c", "d"))
        .await
        .expect_err("backup fails");
    assert!(matches!(err, CurationError::StorageUnavailable { .. }));
    assert_eq!(store.load(ModelType::Cognos).await.expect("load").len(), 1);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_serialised() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 50);
    let repo = Arc::new(repo);

    let mut handles = Vec::new();
    for i in 0..16 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            repo.add_example(ModelType::Cognos, NewExample::new(format!("s{i}"), "d"))
                .await
        }));
    }
    for h in handles {
        h.await.expect("join").expect("add");
    }

    let listing = repo.list_examples(ModelType::Cognos).await.expect("list");
    assert_eq!(listing.examples.len(), 16, "no lost updates");
    let ids: std::collections::HashSet<_> = listing.examples.iter().map(|e| &e.id).collect();
    assert_eq!(ids.len(), 16, "no duplicate ids");
    assert_eq!(repo.list_backups(ModelType::Cognos).await.expect("list").len(), 16);
}

#[tokio::test]
async fn seed_then_correct_sample() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_, repo) = setup(&dir, 10);
    assert_eq!(repo.seed(ModelType::Microstrategy).await.expect("seed"), 3);

    let updated = repo
        .update_correction(ModelType::Microstrategy, "mstr-001", "CALCULATE(SUM([Revenue]), ALL('Sales'))", None)
        .await
        .expect("correct");
    assert_eq!(updated.source_expression, "Sum(Revenue){~+}");
}
