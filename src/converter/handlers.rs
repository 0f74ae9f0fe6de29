//! Custom htmd element handlers.
//!
//! htmd's defaults are kept for most elements; these handlers override the
//! places where crawled documentation pages need different treatment:
//! `<pre>` blocks that escaped protection still become fences, inline
//! `<code>` keeps its angle brackets, and `<a>` falls back to the
//! `aria-label`/`title` attributes when the anchor has no text.

use std::rc::Rc;

use htmd::{
    Element, HtmlToMarkdown,
    element_handler::{HandlerResult, Handlers},
    options::{BulletListMarker, HeadingStyle, Options},
};
use markup5ever_rcdom::{Node, NodeData};

use super::code_blocks::language_from_class_list;

/// Converter with ATX headings, dash bullets and the custom handlers.
pub(crate) fn create_converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .add_handler(vec!["pre"], pre_handler)
        .add_handler(vec!["code"], code_handler)
        .add_handler(vec!["a"], link_handler)
        .build()
}

/// `<pre>` regions normally never reach htmd (protection lifts them out
/// first), but nested or malformed ones can. Fence them without guessing a
/// language from content.
fn pre_handler(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let walked = handlers.walk_children(element.node);
    let content = walked.content.trim_matches('\n');

    if let Some(rest) = content.strip_prefix("```") {
        // the code child already fenced itself; fill in a missing language
        // tag from this element's own attributes
        if rest.starts_with('\n')
            && let Some(language) = language_from_element(&element)
        {
            return Some(HandlerResult::from(format!("\n\n```{language}{rest}\n\n")));
        }
        return Some(HandlerResult::from(format!("\n\n{content}\n\n")));
    }

    let language = language_from_element(&element).unwrap_or_default();
    Some(HandlerResult::from(format!(
        "\n\n```{language}\n{content}\n```\n\n"
    )))
}

fn code_handler(_handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    // Raw text extraction keeps angle-bracket content like <Left> that the
    // default pipeline would treat as unknown tags and drop.
    let content = raw_text_of(element.node);

    if has_pre_ancestor(element.node) {
        let language = language_from_element(&element).unwrap_or_default();
        return Some(HandlerResult::from(format!(
            "```{language}\n{content}\n```"
        )));
    }

    let trimmed = content.trim();
    let result = if trimmed.contains('`') {
        if trimmed.starts_with('`') || trimmed.ends_with('`') {
            format!("`` {trimmed} ``")
        } else {
            format!("``{trimmed}``")
        }
    } else {
        format!("`{trimmed}`")
    };
    Some(HandlerResult::from(result))
}

fn link_handler(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let href = attr_value(element.attrs, "href").unwrap_or_default();

    let walked = handlers.walk_children(element.node);
    let text = walked.content.trim().to_string();
    let text = if text.is_empty() {
        attr_value(element.attrs, "aria-label")
            .or_else(|| attr_value(element.attrs, "title"))
            .unwrap_or_else(|| href.clone())
    } else {
        text
    };

    let result = match attr_value(element.attrs, "title") {
        Some(title) if title != text => format!("[{text}]({href} \"{title}\")"),
        _ => format!("[{text}]({href})"),
    };
    Some(HandlerResult::from(result))
}

fn language_from_element(element: &Element) -> Option<String> {
    if let Some(lang) = attr_value(element.attrs, "data-language")
        && !lang.is_empty()
    {
        return Some(lang.to_ascii_lowercase());
    }
    attr_value(element.attrs, "class").and_then(|classes| language_from_class_list(&classes))
}

fn attr_value(attrs: &[html5ever::Attribute], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| attr.value.to_string())
        .filter(|value| !value.trim().is_empty())
}

/// Text of a node tree exactly as parsed, skipping comments.
fn raw_text_of(node: &Rc<Node>) -> String {
    let mut text = String::new();
    match &node.data {
        NodeData::Text { contents } => text.push_str(&contents.borrow()),
        NodeData::Element { .. } | NodeData::Document | NodeData::Doctype { .. } => {
            for child in node.children.borrow().iter() {
                text.push_str(&raw_text_of(child));
            }
        }
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
    text
}

fn has_pre_ancestor(node: &Rc<Node>) -> bool {
    let mut current = node.parent.take();
    node.parent.set(current.clone());

    while let Some(weak) = current {
        let Some(parent) = weak.upgrade() else {
            break;
        };
        if let NodeData::Element { ref name, .. } = parent.data
            && &*name.local == "pre"
        {
            return true;
        }
        current = parent.parent.take();
        parent.parent.set(current.clone());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_code_keeps_angle_brackets() {
        let converter = create_converter();
        let md = converter
            .convert("<p>Press <code>&lt;Esc&gt;</code> to exit</p>")
            .unwrap();
        assert!(md.contains("`<Esc>`"), "got: {md}");
    }

    #[test]
    fn inline_code_with_backticks_is_double_fenced() {
        let converter = create_converter();
        let md = converter.convert("<p><code>a ` b</code></p>").unwrap();
        assert!(md.contains("``a ` b``"), "got: {md}");
    }

    #[test]
    fn unprotected_pre_still_becomes_a_fence() {
        let converter = create_converter();
        let md = converter
            .convert(r#"<pre class="language-toml"><code>[package]</code></pre>"#)
            .unwrap();
        assert!(md.contains("```toml"), "got: {md}");
        assert!(md.contains("[package]"), "got: {md}");
    }

    #[test]
    fn pre_without_hint_gets_bare_fence() {
        let converter = create_converter();
        let md = converter.convert("<pre><code>plain text</code></pre>").unwrap();
        assert!(md.contains("```\n"), "got: {md}");
        assert!(!md.contains("```plaintext"), "got: {md}");
    }

    #[test]
    fn empty_anchor_falls_back_to_aria_label() {
        let converter = create_converter();
        let md = converter
            .convert(r#"<a href="/guide" aria-label="The Guide"></a>"#)
            .unwrap();
        assert!(md.contains("[The Guide](/guide)"), "got: {md}");
    }

    #[test]
    fn headings_are_atx_and_bullets_are_dashes() {
        let converter = create_converter();
        let md = converter
            .convert("<h2>Section</h2><ul><li>one</li><li>two</li></ul>")
            .unwrap();
        assert!(md.contains("## Section"), "got: {md}");
        // htmd pads the marker; only the dash itself is ours to assert
        let bullet = md
            .lines()
            .find(|line| line.trim_end().ends_with("one"))
            .unwrap_or_default();
        assert!(bullet.trim_start().starts_with("- "), "got: {md}");
    }
}
