//! Heading scanning and anchor slug generation.
//!
//! Both the HTML extractor and the Markdown analyzer index headings, and
//! both derive their anchors here so a heading produces the same slug no
//! matter which side of the conversion it was seen on.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One ATX heading line, levels 1 through 6.
pub(crate) static HEADING_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})\s+(.+)$").expect("BUG: hardcoded heading regex is invalid")
});

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s-]").expect("BUG: hardcoded slug regex is invalid")
});

static SLUG_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\s]+").expect("BUG: hardcoded slug separator regex is invalid")
});

/// A single heading with its position and navigation anchor.
///
/// `line` is 1-based for Markdown sources; headings lifted straight from
/// HTML carry `line: 0` because no source line exists before conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRecord {
    pub level: u8,
    pub text: String,
    pub anchor: String,
    pub line: usize,
}

/// Line-anchored heading scanner for Markdown text. Fenced code is skipped
/// so shell comments never show up as headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingIndexer;

impl HeadingIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// All headings in document order.
    #[must_use]
    pub fn extract(&self, markdown: &str) -> Vec<HeadingRecord> {
        let mut headings = Vec::new();
        let mut in_fence = false;

        for (index, line) in markdown.lines().enumerate() {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }
            if let Some(caps) = HEADING_LINE_RE.captures(line) {
                let text = caps[2].trim().to_string();
                headings.push(HeadingRecord {
                    level: caps[1].len() as u8,
                    anchor: anchor_slug(&text),
                    line: index + 1,
                    text,
                });
            }
        }

        headings
    }
}

/// Build a navigation anchor from heading text.
///
/// Lowercases, strips everything that is not a word character, whitespace
/// or hyphen, then collapses whitespace and hyphen runs into single
/// hyphens. Identical heading texts yield identical anchors; collisions are
/// not deduplicated.
#[must_use]
pub fn anchor_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_RE.replace_all(&lowered, "");
    SLUG_SEPARATOR_RE.replace_all(&stripped, "-").into_owned()
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of_offset(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_levels_and_lines() {
        let md = "# Top\n\nbody\n\n## Nested\n\n###### Deep";
        let headings = HeadingIndexer::new().extract(md);
        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].line, 1);
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].line, 5);
        assert_eq!(headings[2].level, 6);
        assert_eq!(headings[2].line, 7);
    }

    #[test]
    fn seven_hashes_is_not_a_heading() {
        let headings = HeadingIndexer::new().extract("####### nope");
        assert!(headings.is_empty());
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        // "#tag" style lines are not headings; cleanup may fix them earlier.
        let headings = HeadingIndexer::new().extract("#tag");
        assert!(headings.is_empty());
    }

    #[test]
    fn fenced_comments_are_not_headings() {
        let md = "# Real\n\n```bash\n# just a comment\n```";
        let headings = HeadingIndexer::new().extract(md);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "Real");
    }

    #[test]
    fn anchor_strips_punctuation_and_hyphenates() {
        assert_eq!(anchor_slug("Getting Started!"), "getting-started");
        assert_eq!(anchor_slug("API & Reference"), "api-reference");
        assert_eq!(anchor_slug("Rust 2024"), "rust-2024");
    }

    #[test]
    fn identical_texts_collide() {
        assert_eq!(anchor_slug("Overview"), anchor_slug("Overview"));
    }
}
