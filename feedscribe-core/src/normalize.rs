//! Cleanup of raw OCR output from screenshots of social posts.

/// Interface labels that OCR picks up from post screenshots, removed in
/// this order. "Comment" goes before "Comment as", so only the word itself
/// is stripped and the text after it survives.
pub const UI_CHROME: [&str; 12] = [
    "Like",
    "Comment",
    "Share",
    "Reply",
    "• 1st",
    "• 2nd",
    "• 3rd",
    "reactions",
    "comments",
    "Comment as",
    "See translation",
    "Edited",
];

/// Normalizes OCR text: pipes become `I`, whitespace runs collapse to one
/// space, UI chrome is removed, and the ends are trimmed.
///
/// Pipe substitution runs first; chrome removal only ever sees the
/// substituted text.
pub fn normalize_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = raw.replace('|', "I");
    let mut text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    for element in UI_CHROME {
        if text.contains(element) {
            text = text.replace(element, "");
        }
    }

    text.trim().to_string()
}
