//! Change detector behavior over realistic document snapshots, including
//! the spec-level scenarios of one added line and a renamed heading.

use lapis_content::{ChangeDetector, ChangeType, MarkupToMarkdownConverter, RawMarkup};

const OLD_DOC: &str = "# Release Notes\n\nVersion 1.2 is out.\n\n## Fixes\n\n- faster startup\n";

#[test]
fn identical_snapshots_never_diff() {
    let detector = ChangeDetector::new();
    for content in ["", OLD_DOC, "x\ny\nz"] {
        let report = detector.detect_changes(content, content);
        assert!(!report.changed);
        assert_eq!(report.total_changes, 0);
        assert!(report.changes.is_empty());
        assert_eq!(report.summary, "No changes detected");
    }
}

#[test]
fn one_added_line_is_one_addition() {
    let new_doc = format!("{OLD_DOC}- lower memory use\n");
    let report = ChangeDetector::new().detect_changes(OLD_DOC, &new_doc);

    assert!(report.changed);
    let additions: Vec<_> = report
        .changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Added)
        .collect();
    assert_eq!(additions.len(), 1);
    assert_eq!(additions[0].new_value.as_deref(), Some("- lower memory use"));
    assert!(additions[0].location.starts_with("line "));
    assert!(report.summary.contains("1 additions"));
}

#[test]
fn renamed_heading_surfaces_a_structural_change() {
    let new_doc = OLD_DOC.replace("## Fixes", "## Bug Fixes");
    let report = ChangeDetector::new().detect_changes(OLD_DOC, &new_doc);

    let structural = report
        .changes
        .iter()
        .find(|c| c.location == "document structure")
        .expect("heading rename should be structural");
    assert_eq!(structural.significance, 0.7);
    assert_eq!(structural.change_type, ChangeType::Modified);
    assert!(structural.old_value.as_deref().unwrap_or("").contains("## Fixes"));
    assert!(structural.new_value.as_deref().unwrap_or("").contains("## Bug Fixes"));
}

#[test]
fn added_code_block_and_link_are_counted() {
    let new_doc = format!(
        "{OLD_DOC}\n```rust\nfn new() {{}}\n```\n\nSee [the docs](https://example.com/docs).\n"
    );
    let report = ChangeDetector::new().detect_changes(OLD_DOC, &new_doc);

    assert!(report.changes.iter().any(|c| c.location == "code blocks"));
    assert!(report.changes.iter().any(|c| c.location == "links"));
}

#[test]
fn whitespace_only_changes_carry_no_significance() {
    let new_doc = OLD_DOC.replace("## Fixes", "\n## Fixes");
    let report = ChangeDetector::new().detect_changes(OLD_DOC, &new_doc);
    assert!(report.changed);
    assert_eq!(report.total_significance, 0.0);
    assert_eq!(report.significant_changes, 0);
    // filtered from the surfaced list, but the summary still reports it
    assert_eq!(report.summary, "1 additions, minor changes");
}

#[test]
fn code_changes_outweigh_comment_changes() {
    let base = "line\n";
    let with_comment = "line\n// tweaked comment\n";
    let with_import = "line\nimport tracking\n";

    let detector = ChangeDetector::new();
    let comment_report = detector.detect_changes(base, with_comment);
    let import_report = detector.detect_changes(base, with_import);
    assert!(import_report.total_significance > comment_report.total_significance);
}

#[test]
fn threshold_is_configurable() {
    let detector = ChangeDetector::new().with_threshold(0.9);
    let report = detector.detect_changes("prose here", "different prose");
    assert!(report.changed);
    assert_eq!(report.significant_changes, 0);
    assert!(report.total_changes > 0);
}

#[test]
fn detector_diffs_pipeline_output() {
    let converter = MarkupToMarkdownConverter::new();
    let old_md = converter
        .convert(&RawMarkup::new(
            "<h1>API</h1><p>Stable since 1.0.</p>",
            "https://example.com/api",
        ))
        .unwrap();
    let new_md = converter
        .convert(&RawMarkup::new(
            "<h1>API</h1><p>Stable since 1.0.</p><h2>Deprecations</h2><p>None yet.</p>",
            "https://example.com/api",
        ))
        .unwrap();

    let report = ChangeDetector::new().detect_changes(&old_md, &new_md);
    assert!(report.changed);
    assert!(report.changes.iter().any(|c| c.location == "document structure"));

    let diff = ChangeDetector::new().visual_diff(&old_md, &new_md);
    assert!(diff.contains("+## Deprecations"));
}

#[test]
fn is_significant_change_respects_threshold() {
    let detector = ChangeDetector::new();
    assert!(detector.is_significant_change("old", "def handler():", 0.5));
    assert!(!detector.is_significant_change("same text", "same text", 0.0));
}

#[test]
fn reports_round_trip_through_json() {
    let report = ChangeDetector::new().detect_changes("a", "b");
    let json = serde_json::to_string_pretty(&report).unwrap();
    let back: lapis_content::ChangeReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.changed, report.changed);
    assert_eq!(back.total_changes, report.total_changes);
    assert_eq!(back.changes.len(), report.changes.len());
}
