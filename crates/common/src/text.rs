//! Helpers for putting untrusted remote text into logs and error messages.

/// Maximum number of characters of a remote response body kept in diagnostics.
pub const SNIPPET_MAX_CHARS: usize = 512;

/// Trim `body` and cut it to at most `max_chars` characters, appending `…`
/// when something was dropped. Always splits on a char boundary.
#[must_use]
pub fn snippet(body: &str, max_chars: usize) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// [`snippet`] with the default [`SNIPPET_MAX_CHARS`] limit.
#[must_use]
pub fn body_snippet(body: &str) -> String {
    snippet(body, SNIPPET_MAX_CHARS)
}
