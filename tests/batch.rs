//! Batch Selection Integration Tests
//!
//! Tests for new batch layout and for locating the batch a resume picks up.

mod common;

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, SystemTime};

use common::{seed_batch, seed_root, ScriptedGenerator};
use draftmill::adapters::Provider;
use draftmill::config::{ResolvedConfig, BATCH_DIR_PREFIX};
use draftmill::core::{BatchError, BatchSelector, Orchestrator, LEDGER_FILE};
use draftmill::domain::BatchRecord;
use filetime::FileTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn batch_dirs(process_dir: &Path) -> Vec<String> {
    std::fs::read_dir(process_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with(BATCH_DIR_PREFIX))
        .collect()
}

fn backdate(path: &Path, secs_ago: u64) {
    let when = SystemTime::now() - Duration::from_secs(secs_ago);
    filetime::set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
}

fn write_record(config: &ResolvedConfig, dir_name: &str) {
    std::fs::create_dir_all(&config.process_dir).unwrap();
    let record = BatchRecord::new(dir_name, 1);
    std::fs::write(
        config.batch_record_path(),
        serde_json::to_string_pretty(&record).unwrap(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_new_batch_of_thirty() {
    let temp = TempDir::new().unwrap();
    let config = seed_root(temp.path(), 45);
    assert_eq!(config.batch_size, 30);

    let mut orchestrator =
        Orchestrator::new(config.clone(), Box::new(ScriptedGenerator::new()), Provider::Gemini)
            .unwrap()
            .with_rng(StdRng::seed_from_u64(30));
    let prepared = orchestrator.prepare(false).await.unwrap();

    // Exactly one timestamped directory
    let dirs = batch_dirs(&config.process_dir);
    assert_eq!(dirs.len(), 1);
    let stamp = &dirs[0][BATCH_DIR_PREFIX.len()..];
    assert_eq!(stamp.len(), "20261018_090000".len());
    assert_eq!(&stamp[8..9], "_");
    assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));

    // Exactly 30 distinct drafts, all from the source pool
    assert_eq!(prepared.files.len(), 30);
    let unique: HashSet<&String> = prepared.files.iter().collect();
    assert_eq!(unique.len(), 30);
    for name in &prepared.files {
        assert!(config.source_dir.join(name).is_file());
    }

    let md_count = std::fs::read_dir(&prepared.batch.dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |x| x == "md"))
        .count();
    assert_eq!(md_count, 30);

    // Initialized ledger with banner and no done entries
    let ledger = std::fs::read_to_string(prepared.batch.dir.join(LEDGER_FILE)).unwrap();
    assert!(ledger.lines().any(|l| l.starts_with("Started at: ")));
    assert!(ledger.lines().any(|l| l == "Total files: 30"));
    assert_eq!(ledger.lines().filter(|l| l.starts_with("done: ")).count(), 0);

    // Record names the new batch
    let selector = BatchSelector::new(&config);
    let record = selector.active().await.unwrap().unwrap();
    assert_eq!(record.dir_name, dirs[0]);
    assert_eq!(record.total, 30);
}

#[tokio::test]
async fn test_pool_too_small_touches_nothing() {
    let temp = TempDir::new().unwrap();
    let config = seed_root(temp.path(), 10);

    let mut orchestrator =
        Orchestrator::new(config.clone(), Box::new(ScriptedGenerator::new()), Provider::Gemini).unwrap();
    let err = orchestrator.prepare(false).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BatchError>(),
        Some(BatchError::InsufficientSources { found: 10, required: 30, .. })
    ));
    assert!(!config.process_dir.exists());
}

#[tokio::test]
async fn test_resume_prefers_record_over_mtime() {
    let temp = TempDir::new().unwrap();
    let config = seed_root(temp.path(), 0);

    let older = seed_batch(&config, "processed_md_files_20240101_000000", &[("a.md", "### a\n")]);
    let newer = seed_batch(&config, "processed_md_files_20240102_000000", &[("b.md", "### b\n")]);
    backdate(&older, 3600);
    backdate(&newer, 60);

    write_record(&config, "processed_md_files_20240101_000000");

    let batch = BatchSelector::new(&config).resume().await.unwrap();
    assert_eq!(batch.dir, older);
    assert!(batch.resumed);
}

#[tokio::test]
async fn test_resume_falls_back_to_newest_mtime() {
    let temp = TempDir::new().unwrap();
    let config = seed_root(temp.path(), 0);

    // Names sort the other way round from modification times
    let recent = seed_batch(&config, "processed_md_files_20240101_000000", &[("a.md", "### a\n")]);
    let stale = seed_batch(&config, "processed_md_files_20240202_000000", &[("b.md", "### b\n")]);
    seed_batch(&config, "unrelated", &[]);
    backdate(&stale, 7200);
    backdate(&recent, 10);

    let batch = BatchSelector::new(&config).resume().await.unwrap();
    assert_eq!(batch.dir, recent);
}

#[tokio::test]
async fn test_record_for_missing_dir_falls_back() {
    let temp = TempDir::new().unwrap();
    let config = seed_root(temp.path(), 0);

    let existing = seed_batch(&config, "processed_md_files_20240101_000000", &[("a.md", "### a\n")]);
    write_record(&config, "processed_md_files_20991231_235959");

    let batch = BatchSelector::new(&config).resume().await.unwrap();
    assert_eq!(batch.dir, existing);
}

#[tokio::test]
async fn test_resume_of_empty_batch_fails() {
    let temp = TempDir::new().unwrap();
    let config = seed_root(temp.path(), 0);
    seed_batch(&config, "processed_md_files_20240101_000000", &[]);

    let mut orchestrator =
        Orchestrator::new(config.clone(), Box::new(ScriptedGenerator::new()), Provider::Gemini).unwrap();
    assert!(orchestrator.prepare(true).await.is_err());
}
