//! Markdown post-processing after conversion and restoration.
//!
//! Ordered passes: relative URL rewriting, heading spacing, blank-run
//! collapse, then the configurable artifact rules. Heading spacing skips
//! fenced code so restored blocks stay byte-identical.

use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;
use url::Url;

use crate::markdown::headings::HEADING_LINE_RE;

/// Link or image: `(bang)[text](target "title")`.
static LINK_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]]*)\]\(([^)\s]+)(\s+"[^"]*")?\)"#)
        .expect("BUG: hardcoded link target regex is invalid")
});

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n{3,}").expect("BUG: hardcoded blank-run regex is invalid")
});

/// A named pattern-to-replacement rule for site-specific rendering junk.
///
/// The default set handles the artifacts seen on documentation renderers;
/// callers with different sources swap in their own list.
#[derive(Debug, Clone)]
pub struct ArtifactRule {
    pub name: String,
    pattern: Regex,
    replacement: String,
}

impl ArtifactRule {
    pub fn new(name: &str, pattern: &str, replacement: &str) -> anyhow::Result<Self> {
        Ok(Self {
            name: name.to_string(),
            pattern: Regex::new(pattern)
                .with_context(|| format!("invalid pattern for artifact rule `{name}`"))?,
            replacement: replacement.to_string(),
        })
    }

    #[must_use]
    pub fn apply(&self, markdown: &str) -> String {
        self.pattern
            .replace_all(markdown, self.replacement.as_str())
            .into_owned()
    }
}

/// Rules for artifacts that documentation renderers commonly leave behind:
/// links whose visible text is only zero-width characters, and the stray
/// "Copy" lines emitted by copy-to-clipboard buttons.
#[must_use]
pub fn default_artifact_rules() -> Vec<ArtifactRule> {
    vec![
        ArtifactRule::new(
            "zero-width-links",
            r"\[[\u{200b}\u{200c}\u{200d}\u{feff}]+\]\([^)]*\)",
            "",
        )
        .expect("BUG: hardcoded zero-width-links rule is invalid"),
        ArtifactRule::new("copy-button-lines", r"(?m)^\s*Copy\s*$", "")
            .expect("BUG: hardcoded copy-button-lines rule is invalid"),
    ]
}

/// Run all post passes in order and trim the result.
#[must_use]
pub(crate) fn postprocess(markdown: &str, base_url: Option<&str>, rules: &[ArtifactRule]) -> String {
    let mut output = markdown.replace("\r\n", "\n");
    if let Some(base) = base_url {
        output = absolutize_targets(&output, base);
    }
    output = space_headings(&output);
    output = BLANK_RUN_RE.replace_all(&output, "\n\n").into_owned();
    for rule in rules {
        output = rule.apply(&output);
    }
    output.trim().to_string()
}

/// Rewrite relative link and image targets against the base URL. Targets
/// with a scheme (or fragment-only targets) are left alone, as is anything
/// inside a code fence.
fn absolutize_targets(markdown: &str, base_url: &str) -> String {
    let Ok(base) = Url::parse(base_url) else {
        tracing::warn!(base_url, "base URL does not parse, keeping relative targets");
        return markdown.to_string();
    };

    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        let fence_toggle = line.trim_start().starts_with("```");
        if in_fence || fence_toggle {
            out.push(line.to_string());
            if fence_toggle {
                in_fence = !in_fence;
            }
            continue;
        }
        out.push(absolutize_line(line, &base));
    }
    // lines() drops a trailing newline; postprocess trims anyway
    out.join("\n")
}

fn absolutize_line(line: &str, base: &Url) -> String {
    LINK_TARGET_RE
        .replace_all(line, |caps: &regex::Captures| {
            let target = &caps[3];
            if target.starts_with('#') || target.contains(':') {
                return caps[0].to_string();
            }
            match base.join(target) {
                Ok(absolute) => format!(
                    "{}[{}]({}{})",
                    &caps[1],
                    &caps[2],
                    absolute,
                    caps.get(4).map_or("", |m| m.as_str())
                ),
                Err(err) => {
                    tracing::debug!(%err, target, "keeping unresolvable target");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// One blank line before and after each heading, outside code fences.
fn space_headings(markdown: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut after_heading = false;

    for line in markdown.lines() {
        let fence_toggle = line.trim_start().starts_with("```");
        let is_heading = !in_fence && !fence_toggle && HEADING_LINE_RE.is_match(line);
        let is_blank = line.trim().is_empty();

        if after_heading && !is_blank {
            out.push(String::new());
        }
        if is_heading && out.last().is_some_and(|prev| !prev.trim().is_empty()) {
            out.push(String::new());
        }

        out.push(line.to_string());
        after_heading = is_heading;
        if fence_toggle {
            in_fence = !in_fence;
        }
    }

    out.join("\n")
}
