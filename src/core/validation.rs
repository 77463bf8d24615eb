//! Structure checks on rewritten output.
//!
//! A rewrite is expected to come back with the level-3 sections grouped
//! under level-2 headings and a closing summary. Models occasionally drop
//! that structure; these checks catch it before the file is written.

use thiserror::Error;

use crate::domain::heading_level;

use super::prompts::SUMMARY_HEADING;

/// Minimum number of level-2 headings (three groups; the summary is extra)
pub const MIN_GROUP_HEADINGS: usize = 3;

/// Heading counts found in a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingCounts {
    pub level2: usize,
    pub level3: usize,
}

impl HeadingCounts {
    pub fn of(content: &str) -> Self {
        let mut counts = Self::default();
        for line in content.lines() {
            match heading_level(line) {
                Some(2) => counts.level2 += 1,
                Some(3) => counts.level3 += 1,
                _ => {}
            }
        }
        counts
    }
}

/// Ways a rewrite can lose its structure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureViolation {
    #[error("Rewrite has no level-3 sections")]
    NoSections,

    #[error("Rewrite has {actual} level-2 headings, expected at least {expected}")]
    TooFewGroups { actual: usize, expected: usize },

    #[error("Rewrite is missing the closing summary heading")]
    MissingSummary,
}

/// Validate the rewritten document's heading structure
pub fn check_structure(content: &str) -> Result<HeadingCounts, StructureViolation> {
    let counts = HeadingCounts::of(content);

    if counts.level3 == 0 {
        return Err(StructureViolation::NoSections);
    }

    if counts.level2 < MIN_GROUP_HEADINGS {
        return Err(StructureViolation::TooFewGroups {
            actual: counts.level2,
            expected: MIN_GROUP_HEADINGS,
        });
    }

    let last_h2 = content
        .lines()
        .filter(|l| heading_level(l) == Some(2))
        .last()
        .map(str::trim);

    if last_h2 != Some(SUMMARY_HEADING) {
        return Err(StructureViolation::MissingSummary);
    }

    Ok(counts)
}
