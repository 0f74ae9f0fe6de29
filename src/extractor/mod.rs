//! Structural extraction from raw HTML.
//!
//! Parses a captured page, discards everything that is not content
//! (scripts, styles, forms, hidden elements, navigation chrome), isolates
//! the main content region and indexes metadata, links, images and
//! headings. Extraction never errors: malformed markup degrades to empty
//! fields, which is the behavior a crawler pipeline wants when it feeds
//! this whatever the network gave it.

pub mod metadata;

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use ego_tree::{NodeId, NodeRef};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::markdown::headings::{HeadingRecord, anchor_slug};
use crate::markdown::{ImageRecord, LinkKind, LinkRecord};
use metadata::ExtractedMetadata;

/// One captured page: the markup plus the URL it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMarkup {
    pub html: String,
    pub base_url: String,
}

impl RawMarkup {
    pub fn new(html: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            base_url: base_url.into(),
        }
    }
}

/// Everything the extractor pulls out of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub url: String,
    pub title: String,
    pub description: String,
    pub metadata: ExtractedMetadata,
    pub main_text: String,
    pub links: Vec<LinkRecord>,
    pub images: Vec<ImageRecord>,
    pub headings: Vec<HeadingRecord>,
    pub raw_text: String,
    pub word_count: usize,
    pub extracted_at: DateTime<Utc>,
}

static REMOVE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, noscript, iframe, object, embed, form, input, button, select, textarea")
        .expect("BUG: hardcoded CSS selector for removable tags is invalid")
});

static BOILERPLATE_TAG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("nav, header, footer, aside")
        .expect("BUG: hardcoded CSS selector for boilerplate tags is invalid")
});

static ANY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("*").expect("BUG: hardcoded CSS selector `*` is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector `body` is invalid")
});

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector `a[href]` is invalid")
});

static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img[src]").expect("BUG: hardcoded CSS selector `img[src]` is invalid")
});

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6")
        .expect("BUG: hardcoded CSS selector for headings is invalid")
});

/// Main-content strategies, most specific first.
static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "main",
        "article",
        r#"[role="main"]"#,
        "#main",
        "#content",
        ".main",
        ".content",
        ".post",
        ".article",
    ]
    .into_iter()
    .map(|s| Selector::parse(s).expect("BUG: hardcoded content CSS selector is invalid"))
    .collect()
});

static HIDDEN_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden")
        .expect("BUG: hardcoded hidden-style regex is invalid")
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").expect("BUG: hardcoded whitespace regex is invalid")
});

/// Class names that mark navigation chrome rather than content.
const BOILERPLATE_CLASSES: &[&str] = &[
    "navigation",
    "nav",
    "menu",
    "sidebar",
    "breadcrumb",
    "table-of-contents",
    "hidden",
    "invisible",
];

/// DOM-based content extractor. Stateless and cheap to copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralExtractor;

impl StructuralExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract structured content from one captured page.
    #[must_use]
    pub fn extract(&self, markup: &RawMarkup) -> ExtractedContent {
        let document = Html::parse_document(&markup.html);
        let removed = removal_set(&document);

        let metadata = metadata::extract_metadata(&document);
        let links = extract_links(&document, &removed, &markup.base_url);
        let images = extract_images(&document, &removed, &markup.base_url);
        let headings = extract_headings(&document, &removed);
        let main_text = main_content_text(&document, &removed);
        let raw_text = full_text(&document, &removed);

        let title = if metadata.title.is_empty() {
            headings
                .iter()
                .find(|h| h.level == 1)
                .map(|h| h.text.clone())
                .unwrap_or_default()
        } else {
            metadata.title.clone()
        };

        let description = metadata
            .description
            .clone()
            .or_else(|| metadata.og_description.clone())
            .unwrap_or_default();

        ExtractedContent {
            url: markup.base_url.clone(),
            title,
            description,
            // counted over the full cleaned text, not just the main region
            word_count: raw_text.split_whitespace().count(),
            metadata,
            main_text,
            links,
            images,
            headings,
            raw_text,
            extracted_at: Utc::now(),
        }
    }

    /// Cleaned plain text of a fragment or document, with the same
    /// non-content removal rules as full extraction.
    #[must_use]
    pub fn html_to_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let removed = removal_set(&document);
        full_text(&document, &removed)
    }
}

/// Collect the ids of every subtree that must not contribute content:
/// scripts and friends, boilerplate tags, elements hidden by style or
/// attribute, and elements with navigation class names.
fn removal_set(document: &Html) -> HashSet<NodeId> {
    let mut removed = HashSet::new();

    for selector in [&*REMOVE_SELECTOR, &*BOILERPLATE_TAG_SELECTOR] {
        for element in document.select(selector) {
            removed.insert(element.id());
        }
    }

    for element_ref in document.select(&ANY_SELECTOR) {
        let element = element_ref.value();
        if element.attr("hidden").is_some() {
            removed.insert(element_ref.id());
            continue;
        }
        if element.attr("style").is_some_and(|s| HIDDEN_STYLE_RE.is_match(s)) {
            removed.insert(element_ref.id());
            continue;
        }
        if element.attr("class").is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|c| BOILERPLATE_CLASSES.contains(&c.to_ascii_lowercase().as_str()))
        }) {
            removed.insert(element_ref.id());
        }
    }

    removed
}

fn is_removed(element: &ElementRef, removed: &HashSet<NodeId>) -> bool {
    removed.contains(&element.id()) || element.ancestors().any(|a| removed.contains(&a.id()))
}

/// Text of a subtree, skipping removed regions and comments. Walks with an
/// explicit stack so adversarial nesting cannot overflow the call stack.
fn collect_text(root: NodeRef<'_, Node>, removed: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if removed.contains(&node.id()) {
            continue;
        }
        match node.value() {
            Node::Text(text) => {
                out.push_str(&text.text);
                out.push(' ');
            }
            Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
            _ => {
                let children: Vec<_> = node.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }

    out
}

/// Whitespace collapse, zero-width character removal and smart-quote
/// normalization, in that order.
pub(crate) fn clean_text(text: &str) -> String {
    let without_zero_width: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .collect();
    let normalized = without_zero_width
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"");
    WHITESPACE_RE.replace_all(&normalized, " ").trim().to_string()
}

fn main_content_text(document: &Html, removed: &HashSet<NodeId>) -> String {
    for selector in CONTENT_SELECTORS.iter() {
        if let Some(element) = document
            .select(selector)
            .find(|el| !is_removed(el, removed))
        {
            let text = clean_text(&collect_text(*element, removed));
            if !text.is_empty() {
                return text;
            }
        }
    }

    // No content region matched; fall back to the body with boilerplate
    // already in the removal set.
    document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| clean_text(&collect_text(*body, removed)))
        .unwrap_or_default()
}

fn full_text(document: &Html, removed: &HashSet<NodeId>) -> String {
    let root = document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| *body)
        .unwrap_or_else(|| *document.root_element());
    clean_text(&collect_text(root, removed))
}

fn extract_links(document: &Html, removed: &HashSet<NodeId>, base_url: &str) -> Vec<LinkRecord> {
    let base = Url::parse(base_url).ok();
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        if is_removed(&element, removed) {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Some(resolved) = resolve_href(base.as_ref(), href) else {
            continue;
        };
        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let kind = match (base.as_ref().and_then(Url::host_str), resolved.host_str()) {
            (Some(page_host), Some(link_host)) if page_host == link_host => LinkKind::Internal,
            _ => LinkKind::External,
        };

        links.push(LinkRecord {
            url,
            text: clean_text(&element.text().collect::<String>()),
            title: attr_string(&element, "title"),
            rel: attr_string(&element, "rel"),
            target: attr_string(&element, "target"),
            kind,
        });
    }

    links
}

fn extract_images(document: &Html, removed: &HashSet<NodeId>, base_url: &str) -> Vec<ImageRecord> {
    let base = Url::parse(base_url).ok();
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for element in document.select(&IMG_SELECTOR) {
        if is_removed(&element, removed) {
            continue;
        }
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let src = src.trim();
        if src.is_empty() {
            continue;
        }
        let Some(resolved) = resolve_href(base.as_ref(), src) else {
            continue;
        };
        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        images.push(ImageRecord {
            url,
            alt: attr_string(&element, "alt"),
            title: attr_string(&element, "title"),
            width: attr_string(&element, "width"),
            height: attr_string(&element, "height"),
        });
    }

    images
}

fn extract_headings(document: &Html, removed: &HashSet<NodeId>) -> Vec<HeadingRecord> {
    document
        .select(&HEADING_SELECTOR)
        .filter(|el| !is_removed(el, removed))
        .filter_map(|element| {
            let level = element
                .value()
                .name()
                .strip_prefix('h')
                .and_then(|n| n.parse::<u8>().ok())?;
            let text = clean_text(&collect_text(*element, removed));
            if text.is_empty() {
                return None;
            }
            Some(HeadingRecord {
                level,
                anchor: anchor_slug(&text),
                text,
                line: 0, // no source line exists before conversion
            })
        })
        .collect()
}

fn resolve_href(base: Option<&Url>, href: &str) -> Option<Url> {
    match base {
        Some(base) => match base.join(href) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::debug!(%err, href, "skipping unresolvable URL");
                None
            }
        },
        None => Url::parse(href).ok(),
    }
}

fn attr_string(element: &ElementRef, name: &str) -> String {
    element.value().attr(name).unwrap_or_default().trim().to_string()
}
