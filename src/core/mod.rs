//! Core batch logic.
//!
//! This module contains:
//! - Ledger: Append-only progress log
//! - Batch: Batch selection and resume lookup
//! - Reorder, Images, Prompts, Validation: the per-draft stages
//! - Pipeline: The per-draft transform
//! - Orchestrator: Main batch loop
//! - Provision: Folder creation from a name mapping

pub mod batch;
pub mod images;
pub mod ledger;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod provision;
pub mod reorder;
pub mod validation;

// Re-export commonly used types
pub use batch::{latest_batch_dir, Batch, BatchError, BatchSelector};
pub use images::{place_images, ImageInserter, Placement};
pub use ledger::{Ledger, LEDGER_FILE};
pub use orchestrator::{BatchReport, Halt, Orchestrator, PreparedBatch};
pub use pipeline::{TransformError, TransformOutcome, TransformPipeline};
pub use provision::{load_mapping, FolderProvisioner, ProvisionError, ProvisionReport};
pub use reorder::{reorder_sections, Reorder};
pub use validation::{check_structure, StructureViolation};
