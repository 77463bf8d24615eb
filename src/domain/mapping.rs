//! Name mapping from draft file names to asset folder names.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

/// Read-only lookup from `Foo.md` to its romanized asset folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    entries: HashMap<String, String>,
}

impl NameMapping {
    /// Load a mapping from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read name mapping: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse name mapping: {}", path.display()))
    }

    /// Parse a mapping from JSON. Entries whose value is not a non-empty
    /// string are dropped with a warning.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(map) = value else {
            anyhow::bail!("Name mapping must be a JSON object");
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (key, value) in map {
            match value {
                Value::String(folder) if !folder.trim().is_empty() => {
                    entries.insert(key, folder.trim().to_string());
                }
                other => warn!(key = %key, value = %other, "Ignoring invalid mapping entry"),
            }
        }

        Ok(Self { entries })
    }

    /// Folder name for a draft file name
    pub fn folder_for(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for NameMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let mapping =
            NameMapping::from_json(r#"{"ロードモバイル.md": "road-mobile", "bad.md": 3, "empty.md": " "}"#)
                .unwrap();

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.folder_for("ロードモバイル.md"), Some("road-mobile"));
        assert_eq!(mapping.folder_for("bad.md"), None);
        assert_eq!(mapping.folder_for("missing.md"), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(NameMapping::from_json("[1, 2]").is_err());
        assert!(NameMapping::from_json("not json").is_err());
    }
}
