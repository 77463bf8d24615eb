//! Folder provisioning from a name mapping.
//!
//! Creates one directory per mapping value, in the mapping file's order,
//! optionally starting part-way through at a given key. Bad entries are
//! counted and skipped; they never stop the run.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

/// Errors that stop provisioning before any directory is created
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to read mapping file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse mapping file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Mapping file {0} is not a JSON object")]
    NotAnObject(PathBuf),

    #[error("Start key '{0}' not found in mapping")]
    StartKeyNotFound(String),
}

/// Counts from one provisioning run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Entries considered (from the start key onward)
    pub considered: usize,

    /// Directories newly created
    pub created: usize,

    /// Directories that already existed
    pub skipped: usize,

    /// Entries whose value was empty or not a string
    pub invalid: usize,

    /// Entries whose directory could not be created
    pub failed: usize,
}

impl ProvisionReport {
    /// Invalid and failed entries together
    pub fn errors(&self) -> usize {
        self.invalid + self.failed
    }
}

/// Load an ordered mapping from a JSON file
pub fn load_mapping(path: &Path) -> Result<Map<String, Value>, ProvisionError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProvisionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|source| ProvisionError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ProvisionError::NotAnObject(path.to_path_buf())),
    }
}

/// Creates directories under a base directory
pub struct FolderProvisioner {
    base_dir: PathBuf,
}

impl FolderProvisioner {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create every directory from `start_key` onward that does not exist yet
    pub async fn provision(
        &self,
        mapping: &Map<String, Value>,
        start_key: Option<&str>,
    ) -> Result<ProvisionReport, ProvisionError> {
        let start = match start_key {
            Some(key) => mapping
                .keys()
                .position(|k| k == key)
                .ok_or_else(|| ProvisionError::StartKeyNotFound(key.to_string()))?,
            None => 0,
        };

        let mut report = ProvisionReport::default();

        for (key, value) in mapping.iter().skip(start) {
            report.considered += 1;

            let dir_name = match value {
                Value::String(s) if !s.trim().is_empty() => s.trim(),
                other => {
                    warn!(key = %key, value = %other, "Invalid directory name, skipping");
                    report.invalid += 1;
                    continue;
                }
            };

            let target = self.base_dir.join(dir_name);
            if target.exists() {
                debug!(dir = %target.display(), "Directory exists");
                report.skipped += 1;
                continue;
            }

            match fs::create_dir_all(&target).await {
                Ok(()) => {
                    info!(dir = %target.display(), "Created directory");
                    report.created += 1;
                }
                Err(e) => {
                    warn!(dir = %target.display(), error = %e, "Failed to create directory");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
