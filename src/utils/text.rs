/// Character budget for article text sent to the summarization prompt.
pub const SUMMARY_INPUT_MAX_CHARS: usize = 15_000;

/// Character budget for assembled chat history context.
pub const CHAT_CONTEXT_MAX_CHARS: usize = 8_000;

/// Marker appended when text was cut at its budget.
pub const TRUNCATION_MARKER: char = '…';

/// Collapse runs of whitespace/newlines to single spaces, strip the ends,
/// and cut to `max_chars` characters. Deterministic, no hidden state.
pub fn normalize_text(raw: &str, max_chars: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let mut truncated: String = collapsed.chars().take(max_chars).collect();
    truncated.push(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_newlines() {
        let raw = "  Рынок \n\n открылся\tростом.  \n Индекс   вырос. ";
        assert_eq!(
            normalize_text(raw, 1000),
            "Рынок открылся ростом. Индекс вырос."
        );
    }

    #[test]
    fn short_text_passes_through_without_marker() {
        let out = normalize_text("hello world", 50);
        assert_eq!(out, "hello world");
        assert!(!out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn truncates_at_char_budget_with_marker() {
        let raw = "a".repeat(100);
        let out = normalize_text(&raw, 10);
        assert_eq!(out.chars().count(), 11);
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn budget_counts_chars_not_bytes() {
        // Cyrillic chars are 2 bytes each; budget must be in chars.
        let raw = "д".repeat(20);
        let out = normalize_text(&raw, 5);
        assert_eq!(out.chars().count(), 6);
        assert!(out.starts_with("ддддд"));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_text("   \n\t ", 100), "");
    }
}
