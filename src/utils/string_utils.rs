//! UTF-8-safe string truncation.
//!
//! Change descriptions embed fragments of arbitrary page content, which may
//! contain multi-byte characters. Truncating at a byte index would panic on
//! a char boundary, so everything here counts characters.

/// Truncate a string to at most `max_chars` CHARACTERS (not bytes).
///
/// Respects UTF-8 character boundaries and never panics. Returns a slice of
/// the original string, so it allocates nothing.
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let truncated = safe_truncate_chars(s, max_chars);
    if truncated.len() == s.len() {
        s.to_string()
    } else {
        format!("{truncated}...")
    }
}
