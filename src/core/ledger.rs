//! Append-only progress ledger with file-based persistence.
//!
//! Each batch directory holds a `progress.txt`. Status changes are appended
//! as plain-text lines so the file stays readable and hand-editable; the
//! current state is derived by replaying it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::domain::progress::{FINISHED_BANNER, STARTED_BANNER, TOTAL_BANNER};
use crate::domain::{ProgressEntry, ProgressState, ProgressStatus};

/// File name of the ledger inside a batch directory
pub const LEDGER_FILE: &str = "progress.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Plain-text progress ledger for one batch
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Path to the progress.txt file
    path: PathBuf,
}

impl Ledger {
    /// Open the ledger for a batch directory (the file may not exist yet)
    pub fn open(batch_dir: &Path) -> Self {
        Self {
            path: batch_dir.join(LEDGER_FILE),
        }
    }

    /// Get the path to the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the start banner if the ledger is missing or empty.
    ///
    /// Returns true when the banner was written.
    pub async fn initialize(&self, total: usize) -> Result<bool> {
        let empty = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        if !empty {
            return Ok(false);
        }

        let banner = format!(
            "{}{}\n{}{}\n",
            STARTED_BANNER,
            Local::now().format(TIMESTAMP_FORMAT),
            TOTAL_BANNER,
            total
        );

        fs::write(&self.path, banner)
            .await
            .with_context(|| format!("Failed to write ledger: {}", self.path.display()))?;

        Ok(true)
    }

    /// Append a status line for a file
    pub async fn record(&self, status: ProgressStatus, filename: &str) -> Result<()> {
        let entry = ProgressEntry::new(status, filename);
        self.append_line(&entry.to_string()).await
    }

    /// Append the completion banner
    pub async fn finish(&self) -> Result<()> {
        let line = format!("{}{}", FINISHED_BANNER, Local::now().format(TIMESTAMP_FORMAT));
        self.append_line(&line).await
    }

    async fn append_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open ledger: {}", self.path.display()))?;

        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .context("Failed to write ledger line")?;
        file.flush().await.context("Failed to flush ledger")?;

        Ok(())
    }

    /// Replay every line and derive the batch progress
    pub async fn load(&self) -> Result<ProgressState> {
        if !self.path.exists() {
            return Ok(ProgressState::default());
        }

        let file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open ledger: {}", self.path.display()))?;

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut raw = Vec::new();

        while let Some(line) = lines.next_line().await? {
            raw.push(line);
        }

        Ok(ProgressState::from_lines(raw.iter().map(String::as_str)))
    }
}
