//! Char-safe truncation used for previews, titles and tool output display

use std::borrow::Cow;

/// Maximum length of a session's first-message preview
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Maximum length of a derived session title
pub const TITLE_MAX_CHARS: usize = 100;

/// Tool output beyond this many chars is cut when displayed
pub const DISPLAY_MAX_CHARS: usize = 1000;

/// Appended to display-truncated tool output
pub const TRUNCATION_MARKER: &str = "...";

/// Placeholder title for sessions without a usable first user message
pub const UNTITLED_SESSION: &str = "Untitled Session";

/// Returns the longest prefix of `s` holding at most `max_chars` characters
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Preview of a first user message
pub fn preview(text: &str) -> String {
    truncate_chars(text, PREVIEW_MAX_CHARS).to_string()
}

/// Title derived from a preview: its first line, capped at [`TITLE_MAX_CHARS`]
///
/// Returns `None` when the first line is empty so callers can fall back to a placeholder.
pub fn title_from_preview(preview: &str) -> Option<String> {
    let first_line = preview.split('\n').next().unwrap_or_default();
    let title = truncate_chars(first_line, TITLE_MAX_CHARS);
    if title.is_empty() { None } else { Some(title.to_string()) }
}

/// Title for a session: explicit title if present, else derived from the preview, else `placeholder`
pub fn session_title(explicit: Option<&str>, preview: Option<&str>, placeholder: &str) -> String {
    explicit
        .filter(|t| !t.is_empty())
        .map(|t| truncate_chars(t, TITLE_MAX_CHARS).to_string())
        .or_else(|| preview.and_then(title_from_preview))
        .unwrap_or_else(|| placeholder.to_string())
}

/// Display form of tool output: unchanged up to [`DISPLAY_MAX_CHARS`], else cut and marked
pub fn truncate_for_display(content: &str) -> Cow<'_, str> {
    let kept = truncate_chars(content, DISPLAY_MAX_CHARS);
    if kept.len() == content.len() {
        Cow::Borrowed(content)
    } else {
        let mut shown = String::with_capacity(kept.len() + TRUNCATION_MARKER.len());
        shown.push_str(kept);
        shown.push_str(TRUNCATION_MARKER);
        Cow::Owned(shown)
    }
}
