//! Shared fixtures for integration tests.
//!
//! `ScriptedGenerator` stands in for the network: each call pops the next
//! scripted reply and records the prompt it was given.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use draftmill::adapters::{GenerateError, Generator, GeneratorOutput};
use draftmill::config::ResolvedConfig;

/// Generator that replays a fixed script of replies
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<Result<String, GenerateError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, status: u16, message: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(GenerateError::Api {
            status,
            message: message.to_string(),
        }));
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Replies not consumed yet
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _system: &str, prompt: &str) -> Result<GeneratorOutput, GenerateError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(GeneratorOutput::new(text)),
            Some(Err(e)) => Err(e),
            None => Err(GenerateError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// A draft with an `[autohtml]` preamble and six level-3 sections
pub fn six_section_draft() -> String {
    let mut draft = String::from("[autohtml]<div>ranking</div>[/autohtml]\n\n");
    for i in 1..=6 {
        draft.push_str(&format!("### Heading {}\nBody of section {}.\n\n", i, i));
    }
    draft
}

/// A rewrite reply that keeps the expected structure
pub fn structured_rewrite(title: &str) -> String {
    let mut out = String::from("[autohtml]<div>ranking</div>[/autohtml]\n\n");
    for group in 1..=3 {
        out.push_str(&format!("## {} part {}\n\n", title, group));
        for i in 1..=2 {
            out.push_str(&format!("### Rewritten {}-{}\nText.\n\n", group, i));
        }
    }
    out.push_str("## まとめ\n\nSummary.\n");
    out
}

/// Lay out a content root with `count` drafts in the source pool and an
/// empty name mapping
pub fn seed_root(root: &Path, count: usize) -> ResolvedConfig {
    let config = ResolvedConfig::with_root(root);

    std::fs::create_dir_all(&config.source_dir).unwrap();
    for i in 0..count {
        std::fs::write(
            config.source_dir.join(format!("game{:02}.md", i)),
            six_section_draft(),
        )
        .unwrap();
    }

    write_mapping(&config, "{}");
    config
}

pub fn write_mapping(config: &ResolvedConfig, json: &str) {
    std::fs::create_dir_all(config.mapping_path.parent().unwrap()).unwrap();
    std::fs::write(&config.mapping_path, json).unwrap();
}

/// Create a batch directory by hand, as an earlier run would have left it
pub fn seed_batch(config: &ResolvedConfig, name: &str, files: &[(&str, &str)]) -> std::path::PathBuf {
    let dir = config.process_dir.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    for (file, content) in files {
        std::fs::write(dir.join(file), content).unwrap();
    }
    dir
}
