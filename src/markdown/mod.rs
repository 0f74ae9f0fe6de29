//! Markdown structural analysis.
//!
//! Consumes Markdown text only (typically the converter's output, but any
//! Markdown works) and produces an immutable [`MarkdownDocument`] with the
//! heading tree, link/image/code-block indices and basic counts. Analysis
//! never fails: malformed Markdown simply yields emptier indices.

pub mod enhance;
pub mod headings;

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use headings::{HEADING_LINE_RE, HeadingIndexer, HeadingRecord, line_of_offset};

/// Whether a link points at the same host as the page it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Internal,
    External,
}

/// A hyperlink found in a page or document. Absent attributes are empty
/// strings, never missing fields, so serialized records have a fixed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub text: String,
    pub title: String,
    pub rel: String,
    pub target: String,
    pub kind: LinkKind,
}

/// An image reference. `width`/`height` are kept as the source strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub url: String,
    pub alt: String,
    pub title: String,
    pub width: String,
    pub height: String,
}

/// A fenced code block. An empty `language` means the fence carried no tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlockRecord {
    pub language: String,
    pub code: String,
    pub line: usize,
}

/// The analyzed form of one Markdown snapshot.
///
/// Contains no version field; versioning belongs to whatever stores these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownDocument {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub headings: Vec<HeadingRecord>,
    pub links: Vec<LinkRecord>,
    pub images: Vec<ImageRecord>,
    pub code_blocks: Vec<CodeBlockRecord>,
    pub word_count: usize,
    pub char_count: usize,
}

static TIGHT_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#+)([^#\s])").expect("BUG: hardcoded tight-heading regex is invalid")
});

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)[*+]\s").expect("BUG: hardcoded bullet regex is invalid")
});

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n{3,}").expect("BUG: hardcoded blank-run regex is invalid")
});

static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]]*)\]\(([^)\s]+)(?:\s+"([^"]*)")?\)"#)
        .expect("BUG: hardcoded markdown link regex is invalid")
});

pub(crate) static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(\w*)\n(.*?)\n```").expect("BUG: hardcoded code fence regex is invalid")
});

/// Markdown cleaner and structural analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownProcessor {
    indexer: HeadingIndexer,
}

impl MarkdownProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean, index and package a Markdown snapshot.
    ///
    /// A non-empty `title_hint` wins title resolution; otherwise the first
    /// H1 is used, then the first heading of any level, then empty. When a
    /// title is known and the cleaned body does not already start with a
    /// heading, an H1 front-matter line is prepended.
    #[must_use]
    pub fn process(
        &self,
        markdown: &str,
        url: &str,
        title_hint: &str,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> MarkdownDocument {
        let content = self.clean_markdown(markdown);
        let headings = self.indexer.extract(&content);
        let links = extract_links(&content, url);
        let images = extract_images(&content);
        let code_blocks = extract_code_blocks(&content);
        let title = resolve_title(title_hint, &headings);

        let content = if !title.is_empty() && !content.starts_with('#') {
            format!("# {title}\n\n{content}")
        } else {
            content
        };

        MarkdownDocument {
            url: url.to_string(),
            title,
            word_count: content.split_whitespace().count(),
            char_count: content.chars().count(),
            content,
            metadata,
            headings,
            links,
            images,
            code_blocks,
        }
    }

    /// Normalize a Markdown body without analyzing it.
    ///
    /// Line endings become `\n`, `#Text` headings gain their space, `*`/`+`
    /// bullets become `-`, headings get one blank line on each side, blank
    /// runs collapse, and the result is trimmed. Lines inside fenced code
    /// blocks pass through untouched.
    #[must_use]
    pub fn clean_markdown(&self, markdown: &str) -> String {
        let normalized = markdown.replace("\r\n", "\n").replace('\r', "\n");

        let mut out: Vec<String> = Vec::new();
        let mut in_fence = false;
        let mut after_heading = false;

        for line in normalized.lines() {
            let fence_toggle = line.trim_start().starts_with("```");
            if in_fence || fence_toggle {
                out.push(line.to_string());
                after_heading = false;
                if fence_toggle {
                    in_fence = !in_fence;
                }
                continue;
            }

            let line = TIGHT_HEADING_RE.replace(line, "$1 $2");
            let line = BULLET_RE.replace(&line, "${1}- ").into_owned();

            let is_heading = HEADING_LINE_RE.is_match(&line);
            let is_blank = line.trim().is_empty();

            if after_heading && !is_blank {
                out.push(String::new());
            }
            if is_heading && out.last().is_some_and(|prev| !prev.trim().is_empty()) {
                out.push(String::new());
            }

            out.push(line);
            after_heading = is_heading;
        }

        let joined = out.join("\n");
        BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
    }

    /// Merge several documents into one Markdown text with `---` separators
    /// and a per-document source attribution line.
    #[must_use]
    pub fn merge_documents(&self, documents: &[MarkdownDocument]) -> String {
        let sections: Vec<String> = documents
            .iter()
            .map(|doc| {
                let mut section = String::new();
                if !doc.title.is_empty() {
                    section.push_str(&format!("## {}\n", doc.title));
                }
                section.push_str(&format!("*Source: {}*\n\n", doc.url));
                section.push_str(doc.content.trim());
                section
            })
            .collect();
        sections.join("\n\n---\n\n")
    }
}

fn resolve_title(hint: &str, headings: &[HeadingRecord]) -> String {
    let hint = hint.trim();
    if !hint.is_empty() {
        return hint.to_string();
    }
    if let Some(h1) = headings.iter().find(|h| h.level == 1) {
        return h1.text.clone();
    }
    headings.first().map(|h| h.text.clone()).unwrap_or_default()
}

fn extract_links(content: &str, page_url: &str) -> Vec<LinkRecord> {
    let base = Url::parse(page_url).ok();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for caps in MD_LINK_RE.captures_iter(content) {
        if &caps[1] == "!" {
            continue; // image syntax
        }
        let target = caps[3].to_string();
        if !seen.insert(target.clone()) {
            continue;
        }
        links.push(LinkRecord {
            text: caps[2].to_string(),
            title: caps.get(4).map_or(String::new(), |m| m.as_str().to_string()),
            rel: String::new(),
            target: String::new(),
            kind: classify_target(&target, base.as_ref()),
            url: target,
        });
    }
    links
}

fn extract_images(content: &str) -> Vec<ImageRecord> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for caps in MD_LINK_RE.captures_iter(content) {
        if &caps[1] != "!" {
            continue;
        }
        let url = caps[3].to_string();
        if !seen.insert(url.clone()) {
            continue;
        }
        images.push(ImageRecord {
            url,
            alt: caps[2].to_string(),
            title: caps.get(4).map_or(String::new(), |m| m.as_str().to_string()),
            width: String::new(),
            height: String::new(),
        });
    }
    images
}

fn extract_code_blocks(content: &str) -> Vec<CodeBlockRecord> {
    CODE_FENCE_RE
        .captures_iter(content)
        .map(|caps| {
            let offset = caps.get(0).map_or(0, |m| m.start());
            CodeBlockRecord {
                language: caps[1].to_string(),
                code: caps[2].trim().to_string(),
                line: line_of_offset(content, offset),
            }
        })
        .collect()
}

/// Internal iff the resolved target shares the page's host.
pub(crate) fn classify_target(target: &str, base: Option<&Url>) -> LinkKind {
    let Some(base) = base else {
        return LinkKind::External;
    };
    match base.join(target) {
        Ok(resolved) if resolved.host_str().is_some() && resolved.host_str() == base.host_str() => {
            LinkKind::Internal
        }
        _ => LinkKind::External,
    }
}
