//! Metadata extraction from the document head.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector `title` is invalid")
});

static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta").expect("BUG: hardcoded CSS selector `meta` is invalid")
});

static CANONICAL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[rel="canonical"]"#)
        .expect("BUG: hardcoded CSS selector for canonical link is invalid")
});

static HTML_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("html").expect("BUG: hardcoded CSS selector `html` is invalid")
});

/// Well-known page metadata plus a residual map for everything else.
///
/// `title` is always present (possibly empty); the rest are omitted from
/// serialized output when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, String>,
}

/// Pull metadata out of a parsed document. Never fails; unparseable or
/// absent fields are simply left empty.
pub(crate) fn extract_metadata(document: &Html) -> ExtractedMetadata {
    let mut metadata = ExtractedMetadata::default();

    if let Some(title) = document.select(&TITLE_SELECTOR).next() {
        metadata.title = super::clean_text(&title.text().collect::<String>());
    }

    if let Some(html) = document.select(&HTML_SELECTOR).next()
        && let Some(lang) = html.value().attr("lang")
        && !lang.trim().is_empty()
    {
        metadata.language = Some(lang.trim().to_string());
    }

    if let Some(link) = document.select(&CANONICAL_SELECTOR).next()
        && let Some(href) = link.value().attr("href")
        && !href.trim().is_empty()
    {
        metadata.canonical_url = Some(href.trim().to_string());
    }

    for meta in document.select(&META_SELECTOR) {
        let element = meta.value();
        let Some(content) = element.attr("content") else {
            continue;
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        if let Some(name) = element.attr("name") {
            match name.to_ascii_lowercase().as_str() {
                "description" => metadata.description = Some(content.to_string()),
                "keywords" => metadata.keywords = Some(content.to_string()),
                "author" => metadata.author = Some(content.to_string()),
                "viewport" => metadata.viewport = Some(content.to_string()),
                other => {
                    metadata
                        .other
                        .entry(other.to_string())
                        .or_insert_with(|| content.to_string());
                }
            }
        } else if let Some(property) = element.attr("property") {
            match property.to_ascii_lowercase().as_str() {
                "og:title" => metadata.og_title = Some(content.to_string()),
                "og:description" => metadata.og_description = Some(content.to_string()),
                "og:image" => metadata.og_image = Some(content.to_string()),
                "og:type" => metadata.og_type = Some(content.to_string()),
                other => {
                    metadata
                        .other
                        .entry(other.to_string())
                        .or_insert_with(|| content.to_string());
                }
            }
        }
    }

    metadata
}
