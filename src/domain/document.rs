//! Markdown documents split into heading-delimited sections.
//!
//! A draft is an optional preamble (anything before the first level-3
//! heading, typically an `[autohtml]` block) followed by level-3 sections.
//! Parsing is lossless: rendering a parsed document gives back the exact
//! input bytes.

use std::path::Path;

/// Heading level used to delimit sections
pub const SECTION_LEVEL: usize = 3;

/// Number of level-3 sections a draft is expected to carry
pub const EXPECTED_SECTIONS: usize = 6;

/// Return the ATX heading level of a line, if it is a heading
pub fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }

    match trimmed[level..].chars().next() {
        None => Some(level),
        Some(c) if c.is_whitespace() => Some(level),
        _ => None,
    }
}

/// Game title derived from a draft's file name (`Foo.md` -> `Foo`)
pub fn title_from_filename(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// A Markdown draft partitioned into level-3 sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Everything before the first level-3 heading, verbatim
    pub preamble: String,

    /// Each section: heading line plus body, with original line endings
    pub sections: Vec<String>,
}

impl Document {
    /// Split content into preamble and level-3 sections
    pub fn parse(content: &str) -> Self {
        let mut preamble = String::new();
        let mut sections: Vec<String> = Vec::new();

        for line in content.split_inclusive('\n') {
            if heading_level(line) == Some(SECTION_LEVEL) {
                sections.push(line.to_string());
            } else if let Some(current) = sections.last_mut() {
                current.push_str(line);
            } else {
                preamble.push_str(line);
            }
        }

        Self { preamble, sections }
    }

    /// Number of level-3 sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Reassemble the document
    pub fn render(&self) -> String {
        let mut out = self.preamble.clone();
        for section in &self.sections {
            out.push_str(section);
        }
        out
    }
}
