//! Regex cleanup of markup before conversion.
//!
//! Runs after code block protection, so nothing here can damage code.
//! These passes drop whole regions the converter would otherwise turn into
//! noise: scripts, styles, comments, embedded frames and forms.

use std::sync::LazyLock;

use regex::Regex;

/// Hard cap on input size. Larger documents are rejected up front rather
/// than fed to quadratic-ish regex passes.
pub const MAX_HTML_SIZE: usize = 10 * 1024 * 1024;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->").expect("BUG: hardcoded comment regex is invalid")
});

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>")
        .expect("BUG: hardcoded script regex is invalid")
});

static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("BUG: hardcoded style regex is invalid")
});

static NOSCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript>")
        .expect("BUG: hardcoded noscript regex is invalid")
});

static IFRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe>")
        .expect("BUG: hardcoded iframe regex is invalid")
});

static FORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<form\b[^>]*>.*?</form>").expect("BUG: hardcoded form regex is invalid")
});

/// Strip non-content regions. Infallible; the size cap is enforced by the
/// caller before anything else runs.
#[must_use]
pub(crate) fn clean_html(html: &str) -> String {
    let mut cleaned = COMMENT_RE.replace_all(html, "").into_owned();
    for pattern in [&*SCRIPT_RE, &*STYLE_RE, &*NOSCRIPT_RE, &*IFRAME_RE, &*FORM_RE] {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}
