//! draftmill - Resumable batch rewriter for Markdown blog drafts
//!
//! Samples drafts from a source pool into a timestamped working directory,
//! then runs each one through a fixed pipeline: section reorder, persona
//! rewrite by a generative text service, a format pass, and image insertion.
//!
//! # Architecture
//!
//! Progress is kept in an append-only ledger inside each batch directory:
//! - Every draft is marked in-progress before work starts and done after
//!   its rewritten content is on disk
//! - Current progress is derived by replaying the ledger
//! - A halted batch is resumed from the draft left in-progress
//!
//! # Modules
//!
//! - `adapters`: Generative text providers (Gemini, OpenAI)
//! - `core`: Batch logic (Ledger, BatchSelector, TransformPipeline, Orchestrator)
//! - `domain`: Data structures (ProgressEntry, ProgressState, Document, NameMapping)
//! - `config`: Configuration discovery and resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Rewrite a fresh batch of 30 drafts
//! draftmill run
//!
//! # Continue the latest batch with the OpenAI provider
//! draftmill run --resume --api openai
//!
//! # Create asset folders from a name mapping
//! draftmill provision 0-ranking/name_mapping.json --start-key Foo.md
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{Generator, GeneratorOutput, Provider};
pub use config::{load_config, ResolvedConfig};
pub use core::{BatchReport, Ledger, Orchestrator};
pub use domain::{Document, NameMapping, ProgressEntry, ProgressState, ProgressStatus};
