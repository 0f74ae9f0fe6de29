//! Code block protection across the HTML-to-Markdown conversion.
//!
//! `<pre>` regions are lifted out of the markup before any cleaning or
//! conversion touches them and replaced with opaque
//! `CODEBLOCKPLACEHOLDER####` tokens. The tokens are plain text, so they
//! ride through the converter untouched, and restoration substitutes each
//! one with a fenced Markdown block built from the recorded language hint
//! and raw code. Characters that Markdown would otherwise mangle (`#`,
//! `*`, `[`, backticks) therefore survive byte-for-byte.

use std::sync::LazyLock;

use regex::Regex;

/// A `<pre>` optionally wrapped in a "code block" container div that may
/// carry the language class itself.
static WRAPPED_PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<div\b[^>]*class\s*=\s*["'][^"']*code[-_]?block[^"']*["'][^>]*>\s*<pre\b[^>]*>.*?</pre>\s*</div>"#,
    )
    .expect("BUG: hardcoded wrapped-pre regex is invalid")
});

static PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b[^>]*>.*?</pre>").expect("BUG: hardcoded pre regex is invalid")
});

static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)class\s*=\s*["']([^"']*)["']"#)
        .expect("BUG: hardcoded class attribute regex is invalid")
});

static DATA_LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)data-language\s*=\s*["']([^"']*)["']"#)
        .expect("BUG: hardcoded data-language regex is invalid")
});

static BR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>").expect("BUG: hardcoded br regex is invalid")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]+>").expect("BUG: hardcoded tag regex is invalid")
});

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CODEBLOCKPLACEHOLDER(\d{4})")
        .expect("BUG: hardcoded placeholder token regex is invalid")
});

#[derive(Debug, Clone)]
struct ProtectedBlock {
    language: String,
    code: String,
}

/// Lifts `<pre>` regions out of markup and restores them as fenced blocks.
#[derive(Debug, Default)]
pub struct CodeBlockProtector {
    blocks: Vec<ProtectedBlock>,
}

impl CodeBlockProtector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every `<pre>` region with a placeholder token, recording the
    /// language hint and raw code text for restoration.
    #[must_use]
    pub fn protect(&mut self, html: &str) -> String {
        let wrapped = WRAPPED_PRE_RE
            .replace_all(html, |caps: &regex::Captures| self.stash(&caps[0]))
            .into_owned();
        PRE_RE
            .replace_all(&wrapped, |caps: &regex::Captures| self.stash(&caps[0]))
            .into_owned()
    }

    /// Substitute each placeholder token with its fenced Markdown block.
    /// Tokens with no recorded block are left in place and logged.
    #[must_use]
    pub fn restore(&self, markdown: &str) -> String {
        TOKEN_RE
            .replace_all(markdown, |caps: &regex::Captures| {
                let block = caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.blocks.get(index));
                match block {
                    Some(block) => format!(
                        "```{}\n{}\n```",
                        block.language,
                        trim_blank_edges(&block.code)
                    ),
                    None => {
                        tracing::warn!(token = &caps[0], "placeholder without a recorded block");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Number of regions protected so far.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn stash(&mut self, raw: &str) -> String {
        let token = format!("CODEBLOCKPLACEHOLDER{:04}", self.blocks.len());
        self.blocks.push(ProtectedBlock {
            language: detect_language(raw),
            code: extract_code_text(raw),
        });
        // A paragraph of its own so the converter keeps it block-level.
        format!("<p>{token}</p>")
    }
}

/// Language hint from class attributes (`language-x`, `lang-x`) or a
/// `data-language` attribute anywhere in the raw region. Falls back to the
/// empty string; the content itself is never inspected.
fn detect_language(raw: &str) -> String {
    for caps in CLASS_ATTR_RE.captures_iter(raw) {
        if let Some(language) = language_from_class_list(&caps[1]) {
            return language;
        }
    }
    if let Some(caps) = DATA_LANGUAGE_RE.captures(raw) {
        let language = caps[1].trim();
        if !language.is_empty() {
            return language.to_ascii_lowercase();
        }
    }
    String::new()
}

/// `language-<x>` or `lang-<x>` token from a class list.
pub(crate) fn language_from_class_list(classes: &str) -> Option<String> {
    classes.split_whitespace().find_map(|token| {
        token
            .strip_prefix("language-")
            .or_else(|| token.strip_prefix("lang-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_ascii_lowercase)
    })
}

/// Raw code text: `<br>` becomes a newline, remaining tags are stripped,
/// entities are decoded, line endings are normalized.
fn extract_code_text(raw: &str) -> String {
    let with_newlines = BR_RE.replace_all(raw, "\n");
    let without_tags = TAG_RE.replace_all(&with_newlines, "");
    html_escape::decode_html_entities(&without_tags).replace("\r\n", "\n")
}

fn trim_blank_edges(code: &str) -> &str {
    code.trim_matches(['\n', '\r'])
}
