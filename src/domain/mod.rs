//! Domain types for draftmill.
//!
//! This module contains the core data structures:
//! - Progress: Ledger lines and their statuses
//! - Batch: Progress state rebuilt from the ledger, batch records
//! - Document: Markdown drafts split into sections
//! - Mapping: Draft file name to asset folder lookup

pub mod batch;
pub mod document;
pub mod mapping;
pub mod progress;

// Re-export commonly used types
pub use batch::{BatchRecord, ProgressState};
pub use document::{heading_level, title_from_filename, Document, EXPECTED_SECTIONS};
pub use mapping::NameMapping;
pub use progress::{ProgressEntry, ProgressStatus};
