//! Batch state and reconstruction from ledger lines.
//!
//! A batch is one invocation's set of drafts copied into a working directory.
//! Its progress is never stored directly; it is rebuilt by replaying the
//! ledger, the same way every run is resumed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::progress::{is_finished_banner, ProgressEntry, ProgressStatus};

/// Progress of a batch as derived from its ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Files whose output has been written back
    pub done: HashSet<String>,

    /// File marked in-progress by the last marker, if it never completed
    pub interrupted: Option<String>,

    /// Whether the ledger carries a completion banner
    pub finished: bool,

    /// Most recent in-progress marker, completed or not
    last_started: Option<String>,
}

impl ProgressState {
    /// Reconstruct state from raw ledger lines
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut state = Self::default();

        for line in lines {
            if is_finished_banner(line) {
                state.finished = true;
                continue;
            }
            if let Some(entry) = ProgressEntry::parse(line) {
                state.apply_entry(&entry);
            }
        }

        state
    }

    /// Apply a single entry to update state
    pub fn apply_entry(&mut self, entry: &ProgressEntry) {
        match entry.status {
            ProgressStatus::InProgress => {
                self.last_started = Some(entry.filename.clone());
            }
            ProgressStatus::Done => {
                self.done.insert(entry.filename.clone());
            }
        }

        self.interrupted = self
            .last_started
            .as_ref()
            .filter(|name| !self.done.contains(*name))
            .cloned();
    }

    /// Check if a file is already completed
    pub fn is_done(&self, filename: &str) -> bool {
        self.done.contains(filename)
    }

    /// Number of completed files
    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    /// Order the remaining work for a resumed batch.
    ///
    /// Completed files are dropped. If a file was interrupted it goes first,
    /// followed by the other pending files in their original order.
    pub fn pending<'a>(&self, files: &'a [String]) -> Vec<&'a String> {
        let pending: Vec<&String> = files.iter().filter(|f| !self.is_done(f)).collect();

        let Some(ref interrupted) = self.interrupted else {
            return pending;
        };

        match pending.iter().position(|f| *f == interrupted) {
            Some(idx) => {
                let mut ordered = pending[idx..].to_vec();
                ordered.extend_from_slice(&pending[..idx]);
                ordered
            }
            None => pending,
        }
    }
}

/// Explicit record of the batch a resume should pick up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Unique identifier for this batch
    pub id: Uuid,

    /// Working directory name under the process directory
    pub dir_name: String,

    /// When the batch was created
    pub created_at: DateTime<Utc>,

    /// Number of drafts copied into the batch
    pub total: usize,
}

impl BatchRecord {
    pub fn new(dir_name: impl Into<String>, total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            dir_name: dir_name.into(),
            created_at: Utc::now(),
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_marker_is_interrupted() {
        let lines = [
            "Started at: 2026-10-18 09:00:00",
            "Total files: 3",
            "in-progress: a.md",
            "done: a.md",
            "in-progress: b.md",
        ];
        let state = ProgressState::from_lines(lines);

        assert_eq!(state.done_count(), 1);
        assert!(state.is_done("a.md"));
        assert_eq!(state.interrupted.as_deref(), Some("b.md"));
        assert!(!state.finished);
    }

    #[test]
    fn test_completed_marker_is_not_interrupted() {
        let lines = ["in-progress: a.md", "done: a.md"];
        let state = ProgressState::from_lines(lines);

        assert!(state.interrupted.is_none());
    }

    #[test]
    fn test_finished_banner_detected() {
        let lines = ["in-progress: a.md", "done: a.md", "Finished at: 2026-10-18 10:00:00"];
        let state = ProgressState::from_lines(lines);

        assert!(state.finished);
    }

    #[test]
    fn test_pending_starts_at_interrupted_file() {
        let files: Vec<String> = ["a.md", "b.md", "c.md", "d.md"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let state = ProgressState::from_lines(["done: a.md", "in-progress: c.md"]);

        let pending: Vec<&str> = state.pending(&files).iter().map(|s| s.as_str()).collect();
        assert_eq!(pending, vec!["c.md", "d.md", "b.md"]);
    }

    #[test]
    fn test_pending_without_interruption_keeps_order() {
        let files: Vec<String> = ["a.md", "b.md"].iter().map(|s| s.to_string()).collect();
        let state = ProgressState::default();

        let pending: Vec<&str> = state.pending(&files).iter().map(|s| s.as_str()).collect();
        assert_eq!(pending, vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_batch_record_serialization() {
        let record = BatchRecord::new("processed_md_files_20261018_090000", 30);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: BatchRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, record);
    }
}
