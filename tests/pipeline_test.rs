//! End-to-end pipeline tests: raw HTML through extraction, conversion and
//! Markdown analysis.

use std::collections::BTreeMap;

use lapis_content::{
    EnhanceOptions, LinkKind, MarkdownProcessor, MarkupToMarkdownConverter, RawMarkup,
    StructuralExtractor, enhance,
};

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Install Guide</title>
    <meta name="description" content="How to install the thing">
    <meta property="og:title" content="Install Guide (OG)">
</head>
<body>
    <nav><a href="/home">Home</a><a href="/about">About</a></nav>
    <main>
        <h1>Installation</h1>
        <p>Download the binary, then run it. See the <a href="/docs/config">config docs</a>
        and the <a href="/docs/config">same link again</a> or
        <a href="https://releases.example.net/latest">the release page</a>.</p>
        <h2>From Source</h2>
        <pre class="language-bash"><code># clone first
git clone https://example.com/repo.git
make install</code></pre>
        <p>Done.</p>
        <img src="/assets/arch.png" alt="Architecture">
    </main>
    <footer>footer junk</footer>
    <script>analytics();</script>
</body>
</html>"#;

const PAGE_URL: &str = "https://example.com/docs/install";

fn markup() -> RawMarkup {
    RawMarkup::new(PAGE, PAGE_URL)
}

#[test]
fn extraction_finds_structure_and_skips_chrome() {
    let content = StructuralExtractor::new().extract(&markup());

    assert_eq!(content.title, "Install Guide");
    assert_eq!(content.description, "How to install the thing");
    assert!(content.main_text.contains("Download the binary"));
    assert!(!content.main_text.contains("footer junk"));
    assert!(!content.main_text.contains("analytics"));

    let heading_texts: Vec<&str> = content.headings.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(heading_texts, vec!["Installation", "From Source"]);

    // nav links removed, duplicates collapsed, host classification applied
    let urls: Vec<&str> = content.links.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://example.com/docs/config",
            "https://releases.example.net/latest"
        ]
    );
    assert_eq!(content.links[0].kind, LinkKind::Internal);
    assert_eq!(content.links[1].kind, LinkKind::External);

    assert_eq!(content.images.len(), 1);
    assert_eq!(content.images[0].url, "https://example.com/assets/arch.png");
    assert!(content.word_count > 0);
}

#[test]
fn conversion_preserves_code_and_structure() {
    let md = MarkupToMarkdownConverter::new().convert(&markup()).unwrap();

    assert!(md.contains("# Installation"));
    assert!(md.contains("## From Source"));
    // the protected block came back fenced, tagged and byte-identical
    assert!(md.contains("```bash\n# clone first\ngit clone https://example.com/repo.git\nmake install\n```"));
    assert!(!md.contains("CODEBLOCKPLACEHOLDER"));
    assert!(!md.contains("analytics"));
    // relative targets were rewritten against the page URL
    assert!(md.contains("(https://example.com/docs/config)"));
}

#[test]
fn conversion_is_deterministic() {
    let converter = MarkupToMarkdownConverter::new();
    let first = converter.convert(&markup()).unwrap();
    let second = converter.convert(&markup()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn analysis_indexes_the_converted_markdown() {
    let md = MarkupToMarkdownConverter::new().convert(&markup()).unwrap();
    let doc = MarkdownProcessor::new().process(&md, PAGE_URL, "Install Guide", BTreeMap::new());

    assert_eq!(doc.title, "Install Guide");
    assert_eq!(doc.code_blocks.len(), 1);
    assert_eq!(doc.code_blocks[0].language, "bash");
    assert!(doc.code_blocks[0].code.contains("git clone"));

    let anchors: Vec<&str> = doc.headings.iter().map(|h| h.anchor.as_str()).collect();
    assert!(anchors.contains(&"installation"));
    assert!(anchors.contains(&"from-source"));

    assert_eq!(doc.images.len(), 1);
    assert!(doc.word_count > 0);
    assert_eq!(doc.char_count, doc.content.chars().count());
}

#[test]
fn heading_anchor_slugging() {
    let doc = MarkdownProcessor::new().process(
        "# Getting Started!\n\nwelcome",
        PAGE_URL,
        "",
        BTreeMap::new(),
    );
    assert_eq!(doc.headings[0].anchor, "getting-started");
}

#[test]
fn markdown_specials_inside_code_survive_the_whole_pipeline() {
    let markup = RawMarkup::new(
        "<p>prose</p><pre><code>## fake heading\n* fake bullet\n[fake](link)\n`ticks`</code></pre>",
        PAGE_URL,
    );
    let md = MarkupToMarkdownConverter::new().convert(&markup).unwrap();
    let doc = MarkdownProcessor::new().process(&md, PAGE_URL, "", BTreeMap::new());

    let code = &doc.code_blocks[0].code;
    assert!(code.contains("## fake heading"));
    assert!(code.contains("* fake bullet"));
    assert!(code.contains("[fake](link)"));
    assert!(code.contains("`ticks`"));
    // and the fake heading was not indexed as a real one
    assert!(doc.headings.iter().all(|h| h.text != "fake heading"));
}

#[test]
fn enhancement_adds_toc_anchors_and_fence_tags() {
    let md = "# Guide\n\nintro\n\n## Install\n\nsteps\n\n## Use\n\n```\ndef go():\n    pass\n```";
    let enhanced = enhance(md, &EnhanceOptions::default());

    // the anchor step also tags the inserted ToC heading
    assert!(enhanced.contains("<a name=\"table-of-contents\"></a>Table of Contents"));
    assert!(enhanced.contains("- [Guide](#guide)"));
    assert!(enhanced.contains("<a name=\"install\"></a>"));
    assert!(enhanced.contains("```python"));
}

#[test]
fn merged_documents_carry_attribution() {
    let processor = MarkdownProcessor::new();
    let a = processor.process("# First\n\nalpha", "https://example.com/a", "", BTreeMap::new());
    let b = processor.process("# Second\n\nbeta", "https://example.com/b", "", BTreeMap::new());

    let merged = processor.merge_documents(&[a, b]);
    assert!(merged.contains("## First"));
    assert!(merged.contains("*Source: https://example.com/a*"));
    assert!(merged.contains("\n\n---\n\n"));
    assert!(merged.contains("beta"));
}

#[test]
fn html_to_text_convenience() {
    let text = StructuralExtractor::new().html_to_text(
        "<article><h1>Hi</h1><p>there “friend”</p><style>p{}</style></article>",
    );
    assert_eq!(text, "Hi there \"friend\"");
}
