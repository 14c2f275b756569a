//! The prompt trimmer: truncates text to at most N tokens using a
//! deterministic byte-heuristic estimator before interpolation into
//! prompts.

/// Conservative chars-per-token heuristic, close enough for a soft cap —
/// a deterministic estimator is all a soft trim needs.
const CHARS_PER_TOKEN: usize = 4;

/// Truncates `text` to at most `max_tokens` tokens by the heuristic above.
/// Cuts at a char boundary; never panics on multi-byte UTF-8.
#[must_use]
pub fn trim_to_tokens(text: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// Rough token estimate for `text`, used only for logging/diagnostics —
/// never for preflight budget gating.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        let text = "hello world";
        assert_eq!(trim_to_tokens(text, 1000), text);
    }

    #[test]
    fn long_text_is_truncated_to_the_char_budget() {
        let text = "a".repeat(100);
        let trimmed = trim_to_tokens(&text, 10);
        assert_eq!(trimmed.len(), 40);
    }

    #[test]
    fn handles_multibyte_utf8_without_panicking() {
        let text = "é".repeat(50);
        let trimmed = trim_to_tokens(&text, 5);
        assert_eq!(trimmed.chars().count(), 20);
    }
}
