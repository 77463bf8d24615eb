//! Command-line interface for draftmill.
//!
//! Provides commands for running or resuming a rewrite batch, checking the
//! active batch, provisioning asset folders, and showing configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::{build_generator, Provider};
use crate::config::{load_config, ResolvedConfig};
use crate::core::{load_mapping, BatchSelector, FolderProvisioner, Ledger, Orchestrator};

/// draftmill - Resumable batch rewriter for Markdown blog drafts
#[derive(Parser, Debug)]
#[command(name = "draftmill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite a new batch of drafts, or resume the latest one
    Run {
        /// Resume the latest incomplete batch instead of sampling a new one
        #[arg(long)]
        resume: bool,

        /// Generative text provider
        #[arg(long, value_enum, default_value_t = Api::Gemini)]
        api: Api,
    },

    /// Show progress of the active batch
    Status,

    /// Create asset folders from a name mapping file
    Provision {
        /// JSON mapping of draft file names to folder names
        mapping: PathBuf,

        /// Start from this key (file order); earlier entries are ignored
        #[arg(short, long)]
        start_key: Option<String>,

        /// Directory the folders are created in
        #[arg(short, long, default_value = ".")]
        base_dir: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Provider choice for CLI (maps to Provider)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Api {
    /// Google Gemini
    Gemini,

    /// OpenAI chat completions
    Openai,
}

impl From<Api> for Provider {
    fn from(api: Api) -> Self {
        match api {
            Api::Gemini => Provider::Gemini,
            Api::Openai => Provider::Openai,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run { resume, api } => run_batch(resume, api.into()).await,
            Commands::Status => show_status().await,
            Commands::Provision {
                mapping,
                start_key,
                base_dir,
            } => provision(&mapping, start_key.as_deref(), base_dir).await,
            Commands::Config => show_config(),
        }
    }
}

/// Run or resume a batch
async fn run_batch(resume: bool, provider: Provider) -> Result<()> {
    let config = load_config()?;

    // Configuration problems surface before any draft is touched
    let generator = build_generator(provider, &config)
        .with_context(|| format!("Cannot use the {} provider", provider.as_str()))?;
    let mut orchestrator = Orchestrator::new(config, generator, provider)?;

    eprintln!(
        "[Starting {} batch with {}]",
        if resume { "resumed" } else { "new" },
        provider.as_str()
    );

    let report = orchestrator.run(resume).await?;

    for name in &report.passed_through {
        eprintln!("  passed through unchanged: {}", name);
    }
    for name in &report.unformatted {
        eprintln!("  format pass failed, unformatted rewrite kept: {}", name);
    }
    for (name, violation) in &report.structure_warnings {
        eprintln!("  structure warning: {}: {}", name, violation);
    }

    match &report.halted {
        Some(halt) => {
            eprintln!(
                "\n[Batch {} halted on {}: {}]",
                report.batch_dir.display(),
                halt.file,
                halt.error
            );
            eprintln!(
                "[Completed {}/{}; run again with --resume to continue]",
                report.done, report.total
            );
            std::process::exit(1);
        }
        None if report.is_complete() => {
            eprintln!(
                "\n[Batch {} completed: {}/{} drafts]",
                report.batch_dir.display(),
                report.done,
                report.total
            );
        }
        None => {
            eprintln!(
                "\n[Batch {} stopped: {}/{} drafts]",
                report.batch_dir.display(),
                report.done,
                report.total
            );
        }
    }

    Ok(())
}

/// Show the status of the batch a resume would pick up
async fn show_status() -> Result<()> {
    let config = load_config()?;
    let selector = BatchSelector::new(&config);

    let batch = selector.resume().await?;
    let record = selector.active().await?;
    let files = batch.markdown_files()?;
    let state = Ledger::open(&batch.dir).load().await?;

    println!("Batch: {}", batch.dir.display());
    if let Some(record) = record.filter(|r| r.dir_name == batch.name()) {
        println!("Batch ID: {}", record.id);
        println!("Created: {}", record.created_at);
    }
    println!("Drafts: {}", files.len());
    println!("Done: {}", state.done_count());
    match state.interrupted {
        Some(ref file) => println!("Interrupted: {}", file),
        None => println!("Interrupted: -"),
    }
    println!("Finished: {}", if state.finished { "yes" } else { "no" });

    Ok(())
}

/// Create folders from a mapping file
async fn provision(mapping_path: &Path, start_key: Option<&str>, base_dir: PathBuf) -> Result<()> {
    let mapping = load_mapping(mapping_path)?;

    match start_key {
        Some(key) => eprintln!("[Provisioning from '{}' in {}]", key, mapping_path.display()),
        None => eprintln!("[Provisioning all entries in {}]", mapping_path.display()),
    }

    let report = FolderProvisioner::new(base_dir)
        .provision(&mapping, start_key)
        .await?;

    println!("{}", "-".repeat(30));
    println!("Entries considered: {}", report.considered);
    println!("Created: {}", report.created);
    println!("Skipped (already existed): {}", report.skipped);
    if report.errors() > 0 {
        println!("Invalid or failed: {}", report.errors());
    }
    println!("{}", "-".repeat(30));

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = load_config()?;
    print_config(&config);
    Ok(())
}

fn print_config(config: &ResolvedConfig) {
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("Root: {}", config.root.display());
    println!("Source: {}", config.source_dir.display());
    println!("Process: {}", config.process_dir.display());
    println!("Mapping: {}", config.mapping_path.display());
    println!("Batch size: {}", config.batch_size);
    println!("Hero image: {}", config.images.hero);
    println!("Image base URL: {}", config.images.base_url);
    println!("Format pass: {}", config.rewrite.format_pass);
    println!("Strict structure: {}", config.rewrite.strict_structure);
    match config.rewrite.request_timeout_seconds {
        Some(secs) => println!("Request timeout: {}s", secs),
        None => println!("Request timeout: none"),
    }
    for provider in [Provider::Gemini, Provider::Openai] {
        let settings = config.provider(provider);
        println!(
            "Provider {}: model={} persona={}",
            provider.as_str(),
            settings.model,
            settings.persona.name
        );
    }
}
