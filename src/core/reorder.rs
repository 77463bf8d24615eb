//! Section reorder: the first stage of the transform pipeline.
//!
//! The first two level-3 sections anchor the article and stay put. The
//! remaining four are shuffled so each rewrite comes out with a different
//! flow.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Document, EXPECTED_SECTIONS};

/// Number of leading sections that keep their position
pub const FIXED_SECTIONS: usize = 2;

/// Result of the reorder stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reorder {
    /// Sections were permuted
    Reordered(String),

    /// Section count did not match; content is the input, untouched
    Unchanged { content: String, sections: usize },
}

impl Reorder {
    /// The resulting content either way
    pub fn content(&self) -> &str {
        match self {
            Self::Reordered(content) => content,
            Self::Unchanged { content, .. } => content,
        }
    }

    pub fn is_reordered(&self) -> bool {
        matches!(self, Self::Reordered(_))
    }
}

/// Keep the first two sections, shuffle the rest, keep the preamble verbatim
pub fn reorder_sections<R: Rng + ?Sized>(content: &str, rng: &mut R) -> Reorder {
    let doc = Document::parse(content);

    if doc.section_count() != EXPECTED_SECTIONS {
        return Reorder::Unchanged {
            content: content.to_string(),
            sections: doc.section_count(),
        };
    }

    let trailing_newline = content.ends_with('\n');

    // The last section may lack a newline; it can move to the middle
    let mut sections: Vec<String> = doc
        .sections
        .into_iter()
        .map(|mut s| {
            if !s.ends_with('\n') {
                s.push('\n');
            }
            s
        })
        .collect();

    sections[FIXED_SECTIONS..].shuffle(rng);

    let mut out = Document {
        preamble: doc.preamble,
        sections,
    }
    .render();

    if !trailing_newline {
        out.pop();
    }

    Reorder::Reordered(out)
}
