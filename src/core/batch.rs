//! Batch selection: sampling drafts into a fresh working directory, or
//! locating the batch a resume should continue.
//!
//! The active batch is named explicitly in `active_batch.json` under the
//! process directory. Older layouts without that record are still found by
//! picking the most recently modified `processed_md_files_*` directory.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::{ResolvedConfig, BATCH_DIR_PREFIX};
use crate::domain::BatchRecord;

/// Errors that abort batch selection before any draft is touched
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Source pool {dir} has {found} drafts, at least {required} required")]
    InsufficientSources {
        dir: PathBuf,
        found: usize,
        required: usize,
    },

    #[error("No batch directory to resume under {0}; start a new run instead")]
    NoResumeTarget(PathBuf),
}

/// A batch working directory
#[derive(Debug, Clone)]
pub struct Batch {
    /// Absolute path of the working directory
    pub dir: PathBuf,

    /// Whether this batch was picked up by a resume
    pub resumed: bool,
}

impl Batch {
    /// Directory name (e.g. `processed_md_files_20261018_090000`)
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Markdown drafts in the batch, sorted by path
    pub fn markdown_files(&self) -> Result<Vec<PathBuf>> {
        markdown_files_in(&self.dir)
    }
}

/// List `*.md` files directly inside a directory, sorted
pub fn markdown_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.md",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable path");
                None
            }
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Picks drafts into batches and finds batches to resume
pub struct BatchSelector {
    source_dir: PathBuf,
    process_dir: PathBuf,
    record_path: PathBuf,
    batch_size: usize,
}

impl BatchSelector {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            process_dir: config.process_dir.clone(),
            record_path: config.batch_record_path(),
            batch_size: config.batch_size,
        }
    }

    /// Sample drafts from the source pool into a new working directory
    pub async fn create<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Batch> {
        let candidates = markdown_files_in(&self.source_dir)?;

        if candidates.len() < self.batch_size {
            return Err(BatchError::InsufficientSources {
                dir: self.source_dir.clone(),
                found: candidates.len(),
                required: self.batch_size,
            }
            .into());
        }

        let selected: Vec<PathBuf> = candidates
            .choose_multiple(rng, self.batch_size)
            .cloned()
            .collect();

        fs::create_dir_all(&self.process_dir)
            .await
            .with_context(|| {
                format!("Failed to create process directory: {}", self.process_dir.display())
            })?;

        let dir = self.unique_batch_dir();
        fs::create_dir(&dir)
            .await
            .with_context(|| format!("Failed to create batch directory: {}", dir.display()))?;

        info!(dir = %dir.display(), count = selected.len(), "Created batch directory");

        for src in &selected {
            let Some(file_name) = src.file_name() else {
                continue;
            };
            let dest = dir.join(file_name);
            fs::copy(src, &dest)
                .await
                .with_context(|| format!("Failed to copy {} into batch", src.display()))?;
            debug!(file = %file_name.to_string_lossy(), "Copied draft");
        }

        let batch = Batch { dir, resumed: false };
        self.write_record(&BatchRecord::new(batch.name(), selected.len()))
            .await?;

        Ok(batch)
    }

    /// Locate the batch to resume
    pub async fn resume(&self) -> Result<Batch> {
        if let Some(record) = self.read_record().await? {
            let dir = self.process_dir.join(&record.dir_name);
            if dir.is_dir() {
                info!(batch_id = %record.id, dir = %dir.display(), "Resuming recorded batch");
                return Ok(Batch { dir, resumed: true });
            }
            warn!(
                dir = %dir.display(),
                "Recorded batch directory is missing, falling back to newest directory"
            );
        }

        match latest_batch_dir(&self.process_dir)? {
            Some(dir) => {
                info!(dir = %dir.display(), "Resuming most recently modified batch");
                Ok(Batch { dir, resumed: true })
            }
            None => Err(BatchError::NoResumeTarget(self.process_dir.clone()).into()),
        }
    }

    /// The batch named by the record, if any (used by status reporting)
    pub async fn active(&self) -> Result<Option<BatchRecord>> {
        self.read_record().await
    }

    fn unique_batch_dir(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let base = format!("{}{}", BATCH_DIR_PREFIX, stamp);

        let mut candidate = self.process_dir.join(&base);
        let mut suffix = 2;
        while candidate.exists() {
            candidate = self.process_dir.join(format!("{}_{}", base, suffix));
            suffix += 1;
        }
        candidate
    }

    async fn write_record(&self, record: &BatchRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record).context("Failed to serialize batch record")?;
        fs::write(&self.record_path, json)
            .await
            .with_context(|| format!("Failed to write batch record: {}", self.record_path.display()))
    }

    async fn read_record(&self) -> Result<Option<BatchRecord>> {
        if !self.record_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.record_path)
            .await
            .with_context(|| format!("Failed to read batch record: {}", self.record_path.display()))?;

        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(error = %e, path = %self.record_path.display(), "Ignoring unreadable batch record");
                Ok(None)
            }
        }
    }
}

/// Most recently modified batch directory under `process_dir`
pub fn latest_batch_dir(process_dir: &Path) -> Result<Option<PathBuf>> {
    if !process_dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(process_dir)
        .with_context(|| format!("Failed to list {}", process_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let is_batch = entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with(BATCH_DIR_PREFIX))
            .unwrap_or(false);

        if !is_batch || !path.is_dir() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}
