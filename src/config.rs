//! Configuration for draftmill.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (DRAFTMILL_ROOT, DRAFTMILL_SOURCE, DRAFTMILL_MAPPING)
//! 2. Config file (.draftmill/config.yaml)
//! 3. Defaults (~/Pictures/blog)
//!
//! Config file discovery:
//! - Searches current directory and parents for .draftmill/config.yaml
//! - Paths in config file are relative to the project root (parent of .draftmill/)
//!
//! The result is a [`ResolvedConfig`] that is built once in the CLI and handed
//! to every component. Nothing here is cached globally.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::Provider;

/// Directory name prefix for batch working directories
pub const BATCH_DIR_PREFIX: &str = "processed_md_files_";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub batch: Option<BatchConfig>,
    #[serde(default)]
    pub images: Option<ImagesConfig>,
    #[serde(default)]
    pub rewrite: Option<RewriteConfig>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Root content directory (asset folders live directly under it)
    pub root: Option<String>,
    /// Source pool of drafts (relative to root when not absolute)
    pub source: Option<String>,
    /// Base directory for batch working directories (relative to root)
    pub process: Option<String>,
    /// Name mapping JSON file (relative to root)
    pub mapping: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    pub hero: Option<String>,
    pub base_url: Option<String>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriteConfig {
    pub format_pass: Option<bool>,
    pub strict_structure: Option<bool>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub persona: Option<Persona>,
}

/// Tone the persona rewrite should take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Short label used in logs
    pub name: String,
    /// Natural-language description of the voice
    pub tone: String,
}

impl Persona {
    /// Calm, soft, polite register that talks to the reader
    pub fn gentle() -> Self {
        Self {
            name: "gentle".to_string(),
            tone: "落ち着いた柔らかい文体。丁寧な口調で、読者への語りかけが多い。「〜してみてくださいね。」"
                .to_string(),
        }
    }

    /// High-energy register with exploding vocabulary and stretched endings
    pub fn hype() -> Self {
        Self {
            name: "hype".to_string(),
            tone: "テンション高くて語彙が爆発してる系。感嘆符がよくつき、語尾が伸びるときがある「ー！」。"
                .to_string(),
        }
    }
}

/// Resolved settings for one generative text provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub model: String,
    pub base_url: String,
    pub persona: Persona,
}

impl ProviderSettings {
    fn defaults_for(provider: Provider) -> Self {
        match provider {
            Provider::Gemini => Self {
                model: "gemini-1.5-flash".to_string(),
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                persona: Persona::gentle(),
            },
            Provider::Openai => Self {
                model: "gpt-4o".to_string(),
                base_url: "https://api.openai.com".to_string(),
                persona: Persona::hype(),
            },
        }
    }

    fn merged(provider: Provider, raw: Option<&ProviderConfig>) -> Self {
        let mut settings = Self::defaults_for(provider);
        if let Some(raw) = raw {
            if let Some(ref model) = raw.model {
                settings.model = model.clone();
            }
            if let Some(ref base_url) = raw.base_url {
                settings.base_url = base_url.trim_end_matches('/').to_string();
            }
            if let Some(ref persona) = raw.persona {
                settings.persona = persona.clone();
            }
        }
        settings
    }
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    /// File name of the hero image placed under the first heading
    pub hero: String,
    /// URL prefix for image references
    pub base_url: String,
    /// Lowercase extensions (with leading dot) treated as images
    pub extensions: Vec<String>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            hero: "eye.webp".to_string(),
            base_url: "https://cdn.jsdelivr.net/gh/sensation1220/img".to_string(),
            extensions: [".webp", ".png", ".jpg", ".jpeg", ".gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RewriteSettings {
    /// Run the second formatting call after the persona rewrite
    pub format_pass: bool,
    /// Treat a structurally broken rewrite as a failure instead of a warning
    pub strict_structure: bool,
    /// Per-request timeout; None waits indefinitely
    pub request_timeout_seconds: Option<u64>,
}

impl Default for RewriteSettings {
    fn default() -> Self {
        Self {
            format_pass: true,
            strict_structure: false,
            request_timeout_seconds: None,
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Root content directory
    pub root: PathBuf,
    /// Source pool of Markdown drafts
    pub source_dir: PathBuf,
    /// Base directory holding batch working directories
    pub process_dir: PathBuf,
    /// Name mapping JSON file
    pub mapping_path: PathBuf,
    /// Number of drafts sampled into a new batch
    pub batch_size: usize,
    /// Image insertion settings
    pub images: ImageSettings,
    /// Rewrite stage settings
    pub rewrite: RewriteSettings,
    /// Per-provider settings
    pub gemini: ProviderSettings,
    pub openai: ProviderSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Build a configuration rooted at `root` using all defaults
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source_dir: root.join("0-list"),
            process_dir: root.join("3-process"),
            mapping_path: root.join("2-src").join("name_mapping.json"),
            root,
            batch_size: 30,
            images: ImageSettings::default(),
            rewrite: RewriteSettings::default(),
            gemini: ProviderSettings::defaults_for(Provider::Gemini),
            openai: ProviderSettings::defaults_for(Provider::Openai),
            config_file: None,
        }
    }

    /// Settings for the given provider
    pub fn provider(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::Openai => &self.openai,
        }
    }

    /// Path to the active batch record
    pub fn batch_record_path(&self) -> PathBuf {
        self.process_dir.join("active_batch.json")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".draftmill").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to a base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file on top of defaults.
///
/// `base_dir` is the project root that relative `paths.root` entries
/// resolve against.
fn resolve_file(config: ConfigFile, base_dir: &Path, default_root: PathBuf) -> ResolvedConfig {
    let root = match config.paths.root {
        Some(ref root) => resolve_path(base_dir, root),
        None => default_root,
    };

    let mut resolved = ResolvedConfig::with_root(&root);

    if let Some(ref source) = config.paths.source {
        resolved.source_dir = resolve_path(&root, source);
    }
    if let Some(ref process) = config.paths.process {
        resolved.process_dir = resolve_path(&root, process);
    }
    if let Some(ref mapping) = config.paths.mapping {
        resolved.mapping_path = resolve_path(&root, mapping);
    }

    if let Some(size) = config.batch.as_ref().and_then(|b| b.size) {
        resolved.batch_size = size;
    }

    if let Some(images) = config.images {
        if let Some(hero) = images.hero {
            resolved.images.hero = hero;
        }
        if let Some(base_url) = images.base_url {
            resolved.images.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(extensions) = images.extensions {
            resolved.images.extensions = extensions
                .into_iter()
                .map(|e| {
                    let e = e.to_lowercase();
                    if e.starts_with('.') {
                        e
                    } else {
                        format!(".{}", e)
                    }
                })
                .collect();
        }
    }

    if let Some(rewrite) = config.rewrite {
        resolved.rewrite = RewriteSettings {
            format_pass: rewrite.format_pass.unwrap_or(true),
            strict_structure: rewrite.strict_structure.unwrap_or(false),
            request_timeout_seconds: rewrite.request_timeout_seconds,
        };
    }

    resolved.gemini = ProviderSettings::merged(Provider::Gemini, config.providers.get("gemini"));
    resolved.openai = ProviderSettings::merged(Provider::Openai, config.providers.get("openai"));

    resolved
}

/// Apply environment overrides on top of a resolved configuration
fn apply_env(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(root) = std::env::var("DRAFTMILL_ROOT") {
        let root = PathBuf::from(root);
        // Derived paths follow the new root unless set explicitly below
        let defaults = ResolvedConfig::with_root(&root);
        if config.source_dir == config.root.join("0-list") {
            config.source_dir = defaults.source_dir;
        }
        if config.process_dir == config.root.join("3-process") {
            config.process_dir = defaults.process_dir;
        }
        if config.mapping_path == config.root.join("2-src").join("name_mapping.json") {
            config.mapping_path = defaults.mapping_path;
        }
        config.root = root;
    }
    if let Ok(source) = std::env::var("DRAFTMILL_SOURCE") {
        config.source_dir = PathBuf::from(source);
    }
    if let Ok(mapping) = std::env::var("DRAFTMILL_MAPPING") {
        config.mapping_path = PathBuf::from(mapping);
    }
    config
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let default_root = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join("Pictures")
        .join("blog");

    let config_file = find_config_file();

    let resolved = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Base directory is the parent of .draftmill/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        let mut resolved = resolve_file(config, base_dir, default_root);
        resolved.config_file = Some(config_path.clone());
        resolved
    } else {
        ResolvedConfig::with_root(default_root)
    };

    Ok(apply_env(resolved))
}
