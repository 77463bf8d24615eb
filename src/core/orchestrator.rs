//! Main orchestrator for batch execution.
//!
//! Coordinates batch selection, ledger bookkeeping and the per-draft
//! transform pipeline. Drafts are processed strictly one after another.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::fs;
use tracing::{error, info, instrument, warn};

use crate::adapters::{Generator, Provider};
use crate::config::ResolvedConfig;
use crate::domain::{NameMapping, ProgressStatus};

use super::batch::{Batch, BatchSelector};
use super::images::ImageInserter;
use super::ledger::Ledger;
use super::pipeline::{TransformOutcome, TransformPipeline};
use super::validation::StructureViolation;

/// A batch ready for processing
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub batch: Batch,
    pub ledger: Ledger,
    /// Draft file names, sorted
    pub files: Vec<String>,
}

/// Why a batch stopped early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    /// Draft left marked in-progress
    pub file: String,
    pub error: String,
}

/// Summary of one batch invocation
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Working directory of the batch
    pub batch_dir: PathBuf,

    /// Number of drafts in the batch
    pub total: usize,

    /// Drafts completed, including earlier runs
    pub done: usize,

    /// Drafts completed during this invocation
    pub processed: Vec<String>,

    /// Drafts written back untouched because of their section count
    pub passed_through: Vec<String>,

    /// Drafts whose format pass failed; the rewrite was written as-is
    pub unformatted: Vec<String>,

    /// Drafts kept despite a broken rewrite structure
    pub structure_warnings: Vec<(String, StructureViolation)>,

    /// Set when the batch stopped on a rewrite failure
    pub halted: Option<Halt>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.halted.is_none() && self.done == self.total
    }
}

/// Batch orchestrator
pub struct Orchestrator {
    selector: BatchSelector,
    pipeline: TransformPipeline,
    rng: StdRng,
}

impl Orchestrator {
    /// Create an orchestrator for a generator. The persona is the one
    /// configured for `provider`.
    ///
    /// Fails if the name mapping cannot be loaded; nothing on disk is
    /// touched in that case.
    pub fn new(
        config: ResolvedConfig,
        generator: Box<dyn Generator>,
        provider: Provider,
    ) -> Result<Self> {
        let mapping = NameMapping::from_file(&config.mapping_path)?;
        info!(entries = mapping.len(), path = %config.mapping_path.display(), "Loaded name mapping");

        let inserter = ImageInserter::new(&config.root, mapping, config.images.clone());
        let persona = config.provider(provider).persona.clone();
        let pipeline = TransformPipeline::new(generator, inserter, persona, config.rewrite.clone());

        Ok(Self {
            selector: BatchSelector::new(&config),
            pipeline,
            rng: StdRng::from_entropy(),
        })
    }

    /// Replace the random source (deterministic runs in tests)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Select or resume a batch and initialize its ledger
    #[instrument(skip(self))]
    pub async fn prepare(&mut self, resume: bool) -> Result<PreparedBatch> {
        let batch = if resume {
            self.selector.resume().await?
        } else {
            self.selector.create(&mut self.rng).await?
        };

        let files: Vec<String> = batch
            .markdown_files()?
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();

        if files.is_empty() {
            anyhow::bail!("No Markdown drafts found in {}", batch.dir.display());
        }

        let ledger = Ledger::open(&batch.dir);
        if ledger.initialize(files.len()).await? {
            info!(path = %ledger.path().display(), "Initialized progress ledger");
        }

        Ok(PreparedBatch {
            batch,
            ledger,
            files,
        })
    }

    /// Process every pending draft of a prepared batch
    #[instrument(skip(self, prepared), fields(batch = %prepared.batch.name(), provider = %self.pipeline.generator_name()))]
    pub async fn process(&mut self, prepared: PreparedBatch) -> Result<BatchReport> {
        let PreparedBatch {
            batch,
            ledger,
            files,
        } = prepared;

        let state = ledger.load().await?;
        info!(
            total = files.len(),
            done = state.done_count(),
            interrupted = ?state.interrupted,
            "Loaded batch progress"
        );

        let mut report = BatchReport {
            batch_dir: batch.dir.clone(),
            total: files.len(),
            done: 0,
            processed: Vec::new(),
            passed_through: Vec::new(),
            unformatted: Vec::new(),
            structure_warnings: Vec::new(),
            halted: None,
        };

        if let Some(ref interrupted) = state.interrupted {
            info!(file = %interrupted, "Restarting from interrupted draft");
        }

        for name in state.pending(&files) {
            let path = batch.dir.join(name);
            info!(file = %name, "Processing draft");
            ledger.record(ProgressStatus::InProgress, name).await?;

            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read draft: {}", path.display()))?;

            let outcome = match self.pipeline.transform(&path, &content, &mut self.rng).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(file = %name, error = %e, "Draft failed, halting batch");
                    report.halted = Some(Halt {
                        file: name.clone(),
                        error: e.to_string(),
                    });
                    break;
                }
            };

            fs::write(&path, outcome.content())
                .await
                .with_context(|| format!("Failed to write draft: {}", path.display()))?;

            ledger.record(ProgressStatus::Done, name).await?;

            match outcome {
                TransformOutcome::PassedThrough { .. } => {
                    report.passed_through.push(name.clone());
                }
                TransformOutcome::Transformed {
                    format_failed,
                    structure_warning,
                    ..
                } => {
                    if format_failed {
                        report.unformatted.push(name.clone());
                    }
                    if let Some(violation) = structure_warning {
                        report.structure_warnings.push((name.clone(), violation));
                    }
                }
            }
            report.processed.push(name.clone());
            info!(file = %name, "Draft completed");
        }

        let final_state = ledger.load().await?;
        report.done = files.iter().filter(|f| final_state.is_done(f)).count();

        if report.done == files.len() {
            if !final_state.finished {
                ledger.finish().await?;
            }
            info!(total = report.total, "All drafts completed");
        } else {
            warn!(done = report.done, total = report.total, "Batch stopped before completion");
        }

        Ok(report)
    }

    /// Prepare and process a batch in one go
    pub async fn run(&mut self, resume: bool) -> Result<BatchReport> {
        let prepared = self.prepare(resume).await?;
        self.process(prepared).await
    }
}
