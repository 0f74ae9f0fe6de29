//! Optional Markdown enhancement pass.
//!
//! Each step is independently togglable and they always run in the same
//! order: table of contents, heading anchors, external link titles, code
//! fence language tags.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::CODE_FENCE_RE;
use super::headings::{HEADING_LINE_RE, HeadingIndexer};

static EXTERNAL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)")
        .expect("BUG: hardcoded external link regex is invalid")
});

/// Content heuristics for tagging untagged fences. First match wins.
static LANGUAGE_HINTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "python",
            r"(?m)^\s*(def \w+\s*\(|class \w+.*:$|import \w|from \w+ import )",
        ),
        (
            "javascript",
            r"(?m)(\bfunction\s+\w*\s*\(|\bconst \w+\s*=|console\.log|=>)",
        ),
        ("html", r"(?i)<(!doctype|html|head|body|div|span|p|a)\b"),
        ("css", r"(?m)^\s*[.#]?[\w-]+\s*\{$"),
        ("json", r#"(?s)^\s*[\[{].*"[^"]*"\s*:"#),
        (
            "sql",
            r"(?im)^\s*(select|insert into|create table|update|delete from)\b",
        ),
        ("yaml", r"(?m)^[\w-]+:\s+\S"),
    ]
    .into_iter()
    .map(|(lang, pattern)| {
        (
            lang,
            Regex::new(pattern).expect("BUG: hardcoded language hint regex is invalid"),
        )
    })
    .collect()
});

/// Which enhancement steps to apply. All steps default to on.
#[derive(Debug, Clone, Copy)]
pub struct EnhanceOptions {
    pub toc: bool,
    pub anchors: bool,
    pub link_titles: bool,
    pub code_languages: bool,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            toc: true,
            anchors: true,
            link_titles: true,
            code_languages: true,
        }
    }
}

impl EnhanceOptions {
    #[must_use]
    pub fn none() -> Self {
        Self {
            toc: false,
            anchors: false,
            link_titles: false,
            code_languages: false,
        }
    }

    #[must_use]
    pub fn with_toc(mut self, on: bool) -> Self {
        self.toc = on;
        self
    }

    #[must_use]
    pub fn with_anchors(mut self, on: bool) -> Self {
        self.anchors = on;
        self
    }

    #[must_use]
    pub fn with_link_titles(mut self, on: bool) -> Self {
        self.link_titles = on;
        self
    }

    #[must_use]
    pub fn with_code_languages(mut self, on: bool) -> Self {
        self.code_languages = on;
        self
    }
}

/// Apply the enabled enhancement steps in fixed order.
#[must_use]
pub fn enhance(markdown: &str, options: &EnhanceOptions) -> String {
    let mut content = markdown.to_string();
    if options.toc {
        content = add_toc(&content);
    }
    if options.anchors {
        content = add_anchors(&content);
    }
    if options.link_titles {
        content = format_links(&content);
    }
    if options.code_languages {
        content = highlight_code(&content);
    }
    content
}

/// Insert a "Table of Contents" section after the first heading.
///
/// Documents with fewer than three headings are left unchanged. Only
/// headings of level 3 or shallower are listed.
fn add_toc(markdown: &str) -> String {
    let headings = HeadingIndexer::new().extract(markdown);
    if headings.len() < 3 {
        return markdown.to_string();
    }

    let items: Vec<String> = headings
        .iter()
        .filter(|h| h.level <= 3)
        .map(|h| {
            format!(
                "{}- [{}](#{})",
                "  ".repeat(h.level.saturating_sub(1) as usize),
                h.text,
                h.anchor
            )
        })
        .collect();
    let toc = format!("## Table of Contents\n\n{}", items.join("\n"));

    // insert after the line of the first heading
    let first_heading_line = headings[0].line;
    let mut out: Vec<&str> = Vec::new();
    let mut inserted = false;
    for (index, line) in markdown.lines().enumerate() {
        out.push(line);
        if index + 1 == first_heading_line {
            out.push("");
            out.push(&toc);
            inserted = true;
        }
    }
    if !inserted {
        return format!("{toc}\n\n{markdown}");
    }
    out.join("\n")
}

/// Give every heading an inline `<a name="...">` anchor.
fn add_anchors(markdown: &str) -> String {
    map_lines_outside_fences(markdown, |line| {
        match HEADING_LINE_RE.captures(line) {
            Some(caps) => {
                let text = caps[2].trim();
                format!(
                    "{} <a name=\"{}\"></a>{}",
                    &caps[1],
                    super::headings::anchor_slug(text),
                    text
                )
            }
            None => line.to_string(),
        }
    })
}

/// Title external links with their domain so hover text names the site.
fn format_links(markdown: &str) -> String {
    map_lines_outside_fences(markdown, |line| {
        EXTERNAL_LINK_RE
            .replace_all(line, |caps: &regex::Captures| {
                let text = &caps[1];
                let target = &caps[2];
                match Url::parse(target)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                {
                    Some(domain) => format!("[{text}]({target} \"{domain}\")"),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    })
}

/// Apply a per-line transform, passing fenced code through untouched.
fn map_lines_outside_fences<F>(markdown: &str, mut transform: F) -> String
where
    F: FnMut(&str) -> String,
{
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
        out.push(transform(line));
    }
    out.join("\n")
}

/// Tag untagged code fences, falling back to `plaintext`.
fn highlight_code(markdown: &str) -> String {
    CODE_FENCE_RE
        .replace_all(markdown, |caps: &regex::Captures| {
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }
            let code = &caps[2];
            let language = infer_language(code).unwrap_or("plaintext");
            format!("```{language}\n{code}\n```")
        })
        .into_owned()
}

fn infer_language(code: &str) -> Option<&'static str> {
    LANGUAGE_HINTS
        .iter()
        .find(|(_, re)| re.is_match(code))
        .map(|(lang, _)| *lang)
}
