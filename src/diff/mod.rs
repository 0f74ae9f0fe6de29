//! Change detection between content snapshots.
//!
//! Equal SHA-256 hashes short-circuit to an unchanged report without ever
//! running the diff. Otherwise a line diff plus structural scans produce
//! scored [`ContentChange`] records: per-line scores come from ordered
//! first-match-wins heuristics, and a configurable threshold picks which
//! changes are surfaced while `total_significance` still sums all of them.

pub mod line_diff;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::hashing::{hash_content, similarity_hash};
use crate::utils::truncate_with_ellipsis;
use line_diff::{EditKind, diff_lines};

/// Default cutoff for surfacing a change in the report.
pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.1;

/// Longest content fragment embedded in a change description.
const DESCRIPTION_CHARS: usize = 50;

static HEADING_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#{1,6}\s+.+$").expect("BUG: hardcoded heading regex is invalid")
});

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("BUG: hardcoded link regex is invalid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// One scored change between two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChange {
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    pub location: String,
    pub significance: f64,
    pub description: String,
}

/// The full comparison result handed to schedulers and notifiers.
///
/// Invariant: equal hashes mean `changed == false`, empty `changes` and a
/// zero `total_significance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    pub changed: bool,
    pub old_hash: String,
    pub new_hash: String,
    pub similarity_changed: bool,
    pub total_changes: usize,
    pub significant_changes: usize,
    pub total_significance: f64,
    pub changes: Vec<ContentChange>,
    pub summary: String,
}

/// Snapshot comparator with a configurable significance threshold.
#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    significance_threshold: f64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self {
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
        }
    }
}

impl ChangeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.significance_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Compare two snapshots.
    #[must_use]
    pub fn detect_changes(&self, old: &str, new: &str) -> ChangeReport {
        let old_hash = hash_content(old);
        let new_hash = hash_content(new);

        if old_hash == new_hash {
            return ChangeReport {
                changed: false,
                old_hash,
                new_hash,
                similarity_changed: false,
                total_changes: 0,
                significant_changes: 0,
                total_significance: 0.0,
                changes: Vec::new(),
                summary: "No changes detected".to_string(),
            };
        }

        let similarity_changed = similarity_hash(old) != similarity_hash(new);

        let mut changes = line_changes(old, new);
        changes.extend(structural_changes(old, new));

        let total_changes = changes.len();
        let total_significance: f64 = changes.iter().map(|c| c.significance).sum();
        // the summary describes everything detected, even what the
        // threshold keeps out of the surfaced list
        let summary = build_summary(&changes);
        let surfaced: Vec<ContentChange> = changes
            .into_iter()
            .filter(|c| c.significance >= self.significance_threshold)
            .collect();

        ChangeReport {
            changed: true,
            old_hash,
            new_hash,
            similarity_changed,
            total_changes,
            significant_changes: surfaced.len(),
            total_significance,
            summary,
            changes: surfaced,
        }
    }

    /// Whether the accumulated significance of a comparison clears
    /// `threshold`. Identical snapshots are never significant.
    #[must_use]
    pub fn is_significant_change(&self, old: &str, new: &str, threshold: f64) -> bool {
        let report = self.detect_changes(old, new);
        report.changed && report.total_significance >= threshold
    }

    /// Unified-style rendering of the full line diff for display.
    #[must_use]
    pub fn visual_diff(&self, old: &str, new: &str) -> String {
        let mut out = String::from("--- old\n+++ new\n");
        for edit in diff_lines(old, new) {
            let prefix = match edit.kind {
                EditKind::Equal => ' ',
                EditKind::Added => '+',
                EditKind::Removed => '-',
            };
            out.push(prefix);
            out.push_str(edit.text);
            out.push('\n');
        }
        out
    }
}

fn line_changes(old: &str, new: &str) -> Vec<ContentChange> {
    diff_lines(old, new)
        .into_iter()
        .filter_map(|edit| match edit.kind {
            EditKind::Equal => None,
            EditKind::Added => Some(ContentChange {
                change_type: ChangeType::Added,
                old_value: None,
                new_value: Some(edit.text.to_string()),
                location: format!("line {}", edit.new_line),
                significance: line_significance(edit.text),
                description: format!("Added: {}", truncate_with_ellipsis(edit.text, DESCRIPTION_CHARS)),
            }),
            EditKind::Removed => Some(ContentChange {
                change_type: ChangeType::Removed,
                old_value: Some(edit.text.to_string()),
                new_value: None,
                location: format!("line {}", edit.old_line),
                significance: line_significance(edit.text),
                description: format!(
                    "Removed: {}",
                    truncate_with_ellipsis(edit.text, DESCRIPTION_CHARS)
                ),
            }),
        })
        .collect()
}

/// Score one line. Rules are ordered and the first match wins; comment
/// markers are prefix-matched while import and declaration keywords count
/// anywhere in the line. A Markdown heading line is caught by the comment
/// rule first, by design of the ordering, while heading restructuring is
/// still surfaced at 0.7 by the structural scan.
fn line_significance(line: &str) -> f64 {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if ["#", "//", "/*", "*", "--"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        return 0.2;
    }
    let lowered = trimmed.to_lowercase();
    if ["import ", "include ", "require", "use "]
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        return 0.7;
    }
    if ["def ", "class ", "function ", "const ", "let ", "var "]
        .iter()
        .any(|keyword| trimmed.contains(keyword))
    {
        return 0.8;
    }
    if trimmed.starts_with('#') {
        return 0.6;
    }
    if trimmed.contains("http://") || trimmed.contains("https://") {
        return 0.5;
    }
    0.4
}

fn structural_changes(old: &str, new: &str) -> Vec<ContentChange> {
    let mut changes = Vec::new();

    let old_headings: Vec<&str> = HEADING_LINE_RE.find_iter(old).map(|m| m.as_str()).collect();
    let new_headings: Vec<&str> = HEADING_LINE_RE.find_iter(new).map(|m| m.as_str()).collect();
    if old_headings != new_headings {
        changes.push(ContentChange {
            change_type: ChangeType::Modified,
            old_value: Some(old_headings.join("\n")),
            new_value: Some(new_headings.join("\n")),
            location: "document structure".to_string(),
            significance: 0.7,
            description: "Document heading structure changed".to_string(),
        });
    }

    let old_blocks = old.matches("```").count() / 2;
    let new_blocks = new.matches("```").count() / 2;
    if old_blocks != new_blocks {
        changes.push(ContentChange {
            change_type: ChangeType::Modified,
            old_value: Some(old_blocks.to_string()),
            new_value: Some(new_blocks.to_string()),
            location: "code blocks".to_string(),
            significance: 0.6,
            description: format!("Code block count changed from {old_blocks} to {new_blocks}"),
        });
    }

    let old_links = LINK_RE.find_iter(old).count();
    let new_links = LINK_RE.find_iter(new).count();
    if old_links != new_links {
        changes.push(ContentChange {
            change_type: ChangeType::Modified,
            old_value: Some(old_links.to_string()),
            new_value: Some(new_links.to_string()),
            location: "links".to_string(),
            significance: 0.5,
            description: format!("Link count changed from {old_links} to {new_links}"),
        });
    }

    changes
}

fn build_summary(changes: &[ContentChange]) -> String {
    if changes.is_empty() {
        return "No significant changes".to_string();
    }

    let additions = changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Added)
        .count();
    let deletions = changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Removed)
        .count();
    let modifications = changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Modified)
        .count();

    let mut parts = Vec::new();
    if additions > 0 {
        parts.push(format!("{additions} additions"));
    }
    if deletions > 0 {
        parts.push(format!("{deletions} deletions"));
    }
    if modifications > 0 {
        parts.push(format!("{modifications} modifications"));
    }

    let average = changes.iter().map(|c| c.significance).sum::<f64>() / changes.len() as f64;
    let magnitude = if average > 0.7 {
        "major changes"
    } else if average > 0.4 {
        "moderate changes"
    } else {
        "minor changes"
    };

    format!("{}, {}", parts.join(", "), magnitude)
}
