//! Session name sanitization.
//!
//! tmux rejects `.` and `:` in session names (they are target separators),
//! and shell quoting gets awkward with anything outside plain ASCII, so
//! presentation titles are normalized before they become session names.

use deunicode::deunicode;

/// Fallback name when sanitization produces an empty result.
const FALLBACK_NAME: &str = "presentation";

/// Maximum session name length kept after sanitization.
const MAX_SESSION_NAME_LENGTH: usize = 48;

/// Derives a tmux-safe session name from a presentation title.
///
/// Applies the following transformations in order:
/// 1. Unicode → ASCII transliteration
/// 2. Whitespace → hyphens (collapsed)
/// 3. Everything except alphanumerics, `_` and `-` removed
/// 4. Leading/trailing hyphens trimmed, length capped
/// 5. Empty results → "presentation" fallback
pub fn session_name(title: &str) -> String {
    let ascii = deunicode(title);

    let mut result = String::with_capacity(ascii.len());
    let mut last_was_hyphen = false;

    for c in ascii.chars() {
        if c.is_whitespace() || c == '-' {
            if !last_was_hyphen {
                result.push('-');
                last_was_hyphen = true;
            }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        }
    }

    let trimmed: String = result
        .trim_matches('-')
        .chars()
        .take(MAX_SESSION_NAME_LENGTH)
        .collect();
    let trimmed = trimmed.trim_end_matches('-');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
