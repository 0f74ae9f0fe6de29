//! HTML to Markdown conversion.
//!
//! Three phases: protect `<pre>` regions behind opaque placeholder tokens,
//! clean and convert the remaining markup, then restore each token as a
//! fenced block. The only error path is the input size cap; everything
//! else degrades and logs.

pub mod code_blocks;
mod handlers;
mod html_cleaning;
mod postprocessing;

use anyhow::{Context, Result, ensure};

pub use code_blocks::CodeBlockProtector;
pub use html_cleaning::MAX_HTML_SIZE;
pub use postprocessing::{ArtifactRule, default_artifact_rules};

use crate::extractor::RawMarkup;

/// Conversion configuration. The defaults suit crawled documentation
/// pages; `artifact_rules` is the extension point for site-specific junk.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Base for rewriting relative link and image targets when converting
    /// bare HTML. `convert` on a [`RawMarkup`] uses the markup's own URL.
    pub base_url: Option<String>,
    pub artifact_rules: Vec<ArtifactRule>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            artifact_rules: default_artifact_rules(),
        }
    }
}

impl ConversionOptions {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_artifact_rules(mut self, rules: Vec<ArtifactRule>) -> Self {
        self.artifact_rules = rules;
        self
    }
}

/// Code-block-preserving HTML to Markdown converter.
#[derive(Debug, Clone, Default)]
pub struct MarkupToMarkdownConverter {
    options: ConversionOptions,
}

impl MarkupToMarkdownConverter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: ConversionOptions) -> Self {
        Self { options }
    }

    /// Convert a captured page, rewriting relative targets against its URL.
    pub fn convert(&self, markup: &RawMarkup) -> Result<String> {
        self.convert_with_base(&markup.html, Some(&markup.base_url))
    }

    /// Convert bare HTML using the configured base URL, if any.
    pub fn convert_html(&self, html: &str) -> Result<String> {
        self.convert_with_base(html, self.options.base_url.as_deref())
    }

    fn convert_with_base(&self, html: &str, base_url: Option<&str>) -> Result<String> {
        ensure!(
            html.len() <= MAX_HTML_SIZE,
            "input HTML is {} bytes, over the {} byte limit",
            html.len(),
            MAX_HTML_SIZE
        );

        let mut protector = CodeBlockProtector::new();
        let protected = protector.protect(html);
        if protector.block_count() > 0 {
            tracing::debug!(blocks = protector.block_count(), "protected code blocks");
        }

        let cleaned = html_cleaning::clean_html(&protected);
        let markdown = handlers::create_converter()
            .convert(&cleaned)
            .context("markup to markdown conversion failed")?;
        let restored = protector.restore(&markdown);

        Ok(postprocessing::postprocess(
            &restored,
            base_url,
            &self.options.artifact_rules,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        MarkupToMarkdownConverter::new()
            .convert(&RawMarkup::new(html, "https://example.com/docs/"))
            .unwrap()
    }

    #[test]
    fn paragraph_and_code_block() {
        let md = convert(
            r#"<h1>Title</h1><p>Some prose.</p><pre class="language-rust"><code>fn main() {
    println!("hi");
}</code></pre>"#,
        );
        assert!(md.starts_with("# Title"));
        assert!(md.contains("Some prose."));
        assert!(md.contains("```rust\nfn main() {\n    println!(\"hi\");\n}\n```"));
        assert!(!md.contains("CODEBLOCKPLACEHOLDER"));
    }

    #[test]
    fn conversion_is_deterministic() {
        let html = "<h1>T</h1><p>body</p><pre><code>x = 1</code></pre>";
        assert_eq!(convert(html), convert(html));
    }

    #[test]
    fn markdown_control_chars_in_code_survive() {
        let md = convert("<pre><code># heading?\n* bullet?\n[link]?\n`tick`</code></pre>");
        assert!(md.contains("# heading?"));
        assert!(md.contains("* bullet?"));
        assert!(md.contains("[link]?"));
        assert!(md.contains("`tick`"));
    }

    #[test]
    fn scripts_never_reach_the_output() {
        let md = convert("<p>keep</p><script>alert('x')</script>");
        assert!(md.contains("keep"));
        assert!(!md.contains("alert"));
    }

    #[test]
    fn relative_links_are_rewritten_against_the_page_url() {
        let md = convert(r#"<a href="guide">Guide</a>"#);
        assert!(md.contains("[Guide](https://example.com/docs/guide)"), "got: {md}");
    }

    #[test]
    fn oversized_input_is_rejected() {
        let big = "x".repeat(MAX_HTML_SIZE + 1);
        let result = MarkupToMarkdownConverter::new()
            .convert(&RawMarkup::new(big, "https://example.com"));
        assert!(result.is_err());
    }

    #[test]
    fn convert_html_uses_configured_base() {
        let converter = MarkupToMarkdownConverter::with_options(
            ConversionOptions::default().with_base_url("https://example.com/"),
        );
        let md = converter.convert_html(r#"<a href="/x">x</a>"#).unwrap();
        assert!(md.contains("https://example.com/x"));
    }
}
