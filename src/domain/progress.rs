//! Progress entries recorded in a batch ledger.
//!
//! Every status change is one line of plain text in `progress.txt`. Lines are
//! never rewritten; state is derived by reading them back in order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix written for a file that has started processing
pub const IN_PROGRESS_PREFIX: &str = "in-progress: ";

/// Prefix written for a file whose output has been written back
pub const DONE_PREFIX: &str = "done: ";

/// Prefixes found in ledgers produced by the earlier tooling
const LEGACY_IN_PROGRESS_PREFIX: &str = "処理中: ";
const LEGACY_DONE_PREFIX: &str = "完了: ";
const LEGACY_FINISHED_BANNER: &str = "全処理完了: ";

/// Banner line prefixes (informational; only the finished banner is read back)
pub const STARTED_BANNER: &str = "Started at: ";
pub const TOTAL_BANNER: &str = "Total files: ";
pub const FINISHED_BANNER: &str = "Finished at: ";

/// Whether a ledger line marks the whole batch as finished
pub fn is_finished_banner(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with(FINISHED_BANNER) || line.starts_with(LEGACY_FINISHED_BANNER)
}

/// Status of a single file within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Processing started but no output written yet
    InProgress,

    /// Output written back to disk
    Done,
}

impl ProgressStatus {
    /// Line prefix used when writing this status
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::InProgress => IN_PROGRESS_PREFIX,
            Self::Done => DONE_PREFIX,
        }
    }
}

/// One recorded status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub status: ProgressStatus,
    pub filename: String,
}

impl ProgressEntry {
    pub fn new(status: ProgressStatus, filename: impl Into<String>) -> Self {
        Self {
            status,
            filename: filename.into(),
        }
    }

    /// Parse a ledger line.
    ///
    /// Banner lines, blank lines and anything with an unknown prefix yield
    /// `None`. Legacy prefixes are accepted so older batches stay resumable.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        let (status, rest) = if let Some(rest) = line.strip_prefix(IN_PROGRESS_PREFIX) {
            (ProgressStatus::InProgress, rest)
        } else if let Some(rest) = line.strip_prefix(DONE_PREFIX) {
            (ProgressStatus::Done, rest)
        } else if let Some(rest) = line.strip_prefix(LEGACY_IN_PROGRESS_PREFIX) {
            (ProgressStatus::InProgress, rest)
        } else if let Some(rest) = line.strip_prefix(LEGACY_DONE_PREFIX) {
            (ProgressStatus::Done, rest)
        } else {
            return None;
        };

        if rest.is_empty() {
            return None;
        }

        Some(Self::new(status, rest))
    }
}

impl fmt::Display for ProgressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.status.prefix(), self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_line_format() {
        let entry = ProgressEntry::new(ProgressStatus::InProgress, "game.md");
        assert_eq!(entry.to_string(), "in-progress: game.md");

        let entry = ProgressEntry::new(ProgressStatus::Done, "game.md");
        assert_eq!(entry.to_string(), "done: game.md");
    }

    #[test]
    fn test_parse_known_prefixes() {
        assert_eq!(
            ProgressEntry::parse("done: a.md\n"),
            Some(ProgressEntry::new(ProgressStatus::Done, "a.md"))
        );
        assert_eq!(
            ProgressEntry::parse("in-progress: ロードモバイル.md"),
            Some(ProgressEntry::new(ProgressStatus::InProgress, "ロードモバイル.md"))
        );
    }

    #[test]
    fn test_parse_legacy_prefixes() {
        assert_eq!(
            ProgressEntry::parse("完了: old.md"),
            Some(ProgressEntry::new(ProgressStatus::Done, "old.md"))
        );
        assert_eq!(
            ProgressEntry::parse("処理中: old.md"),
            Some(ProgressEntry::new(ProgressStatus::InProgress, "old.md"))
        );
    }

    #[test]
    fn test_finished_banner_detection() {
        assert!(is_finished_banner("Finished at: 2026-10-18 10:00:00"));
        assert!(is_finished_banner("全処理完了: 2024-03-01 11:00:00"));
        assert!(!is_finished_banner("完了: a.md"));
        assert!(!is_finished_banner("Started at: 2026-10-18 09:00:00"));
    }

    #[test]
    fn test_banner_lines_ignored() {
        assert!(ProgressEntry::parse("Started at: 2026-01-01 10:00:00").is_none());
        assert!(ProgressEntry::parse("Total files: 30").is_none());
        assert!(ProgressEntry::parse("Finished at: 2026-01-01 12:00:00").is_none());
        assert!(ProgressEntry::parse("").is_none());
        assert!(ProgressEntry::parse("done: ").is_none());
    }
}
