//! Content transform pipeline.
//!
//! Each draft runs through four stages in order:
//! 1. Section reorder (local)
//! 2. Persona rewrite (external call, failure halts the batch)
//! 3. Format pass (external call, failure falls back to the rewrite)
//! 4. Image insertion (local, missing assets only warn)
//!
//! A draft without exactly six level-3 sections skips every stage and is
//! written back untouched.

use std::path::Path;
use std::time::Instant;

use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::adapters::{GenerateError, Generator};
use crate::config::{Persona, RewriteSettings};
use crate::domain::title_from_filename;

use super::images::ImageInserter;
use super::prompts::{format_prompt, rewrite_prompt, SYSTEM_PROMPT};
use super::reorder::{reorder_sections, Reorder};
use super::validation::{check_structure, StructureViolation};

/// Failures that stop the batch
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Persona rewrite failed for {file}: {source}")]
    Rewrite {
        file: String,
        #[source]
        source: GenerateError,
    },

    #[error("Rewrite of {file} lost its structure: {violation}")]
    Structure {
        file: String,
        violation: StructureViolation,
    },
}

/// Result of transforming one draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// Section count did not match; content is the original draft
    PassedThrough { content: String, sections: usize },

    /// Draft was rewritten
    Transformed {
        content: String,
        /// Format pass failed and the unformatted rewrite was used
        format_failed: bool,
        /// Structure problem tolerated in non-strict mode
        structure_warning: Option<StructureViolation>,
    },
}

impl TransformOutcome {
    /// Content to write back
    pub fn content(&self) -> &str {
        match self {
            Self::PassedThrough { content, .. } => content,
            Self::Transformed { content, .. } => content,
        }
    }
}

/// Runs the per-draft stages against a generator
pub struct TransformPipeline {
    generator: Box<dyn Generator>,
    inserter: ImageInserter,
    persona: Persona,
    settings: RewriteSettings,
}

impl TransformPipeline {
    pub fn new(
        generator: Box<dyn Generator>,
        inserter: ImageInserter,
        persona: Persona,
        settings: RewriteSettings,
    ) -> Self {
        Self {
            generator,
            inserter,
            persona,
            settings,
        }
    }

    /// Name of the generator in use
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Transform one draft. `path` identifies the draft; nothing is read or
    /// written here.
    #[instrument(skip(self, content, rng), fields(provider = %self.generator.name()))]
    pub async fn transform<R: Rng + Send + ?Sized>(
        &self,
        path: &Path,
        content: &str,
        rng: &mut R,
    ) -> Result<TransformOutcome, TransformError> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Stage 1
        let reordered = match reorder_sections(content, rng) {
            Reorder::Reordered(reordered) => reordered,
            Reorder::Unchanged { content, sections } => {
                warn!(file = %file, sections, "Unexpected section count, passing draft through");
                return Ok(TransformOutcome::PassedThrough { content, sections });
            }
        };

        // Stage 2
        let title = title_from_filename(path);
        let rewritten = self.rewrite(&file, &reordered, &title).await?;

        // Stage 3
        let (text, format_failed) = if self.settings.format_pass {
            match self.format(&rewritten).await {
                Ok(text) => (text, false),
                Err(e) => {
                    warn!(file = %file, error = %e, "Format pass failed, using unformatted rewrite");
                    (rewritten, true)
                }
            }
        } else {
            (rewritten, false)
        };

        let structure_warning = match check_structure(&text) {
            Ok(_) => None,
            Err(violation) if self.settings.strict_structure => {
                return Err(TransformError::Structure { file, violation });
            }
            Err(violation) => {
                warn!(file = %file, %violation, "Rewrite structure looks wrong, keeping it anyway");
                Some(violation)
            }
        };

        // Stage 4
        let content = self.inserter.insert(&text, &file, rng);

        Ok(TransformOutcome::Transformed {
            content,
            format_failed,
            structure_warning,
        })
    }

    async fn rewrite(&self, file: &str, reordered: &str, title: &str) -> Result<String, TransformError> {
        let started = Instant::now();
        let prompt = rewrite_prompt(reordered, title, &self.persona);

        let output = self
            .generator
            .generate(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|source| TransformError::Rewrite {
                file: file.to_string(),
                source,
            })?;

        info!(
            file = %file,
            persona = %self.persona.name,
            duration_ms = started.elapsed().as_millis() as u64,
            tokens = ?output.tokens_used,
            "Persona rewrite completed"
        );

        Ok(output.content.trim().to_string())
    }

    async fn format(&self, rewritten: &str) -> Result<String, GenerateError> {
        let output = self
            .generator
            .generate(SYSTEM_PROMPT, &format_prompt(rewritten))
            .await?;

        let text = output.content.trim();
        if text.is_empty() {
            return Err(GenerateError::EmptyContent {
                provider: self.generator.name().to_string(),
            });
        }
        Ok(text.to_string())
    }
}
