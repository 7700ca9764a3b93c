//! Output cleaning for translation model responses (§4.3).
//!
//! A fixed ordered list of prefix/affix rules, applied as a pure function
//! (§9: "Regex-heavy output cleaning → a fixed ordered list of
//! prefix/affix rules defined once; cleaning is a pure function.").

/// Meta-thought prefixes models occasionally prepend before the actual
/// translation. Order matters only in that each is tried in turn; none
/// overlap in practice.
const PREFIX_RULES: &[&str] = &[
    "Note:",
    "Wait:",
    "Hmm",
    "Let's output",
    "I'll output",
    "I'll choose",
    "I'll render",
    "Output only",
    "But requirement says",
    "Better to render as",
];

/// Strip meta-thought prefixes and collapse a newline-separated preamble
/// down to its final line (§4.3).
pub fn clean_translation_output(raw: &str) -> String {
    let mut text = collapse_to_last_line(raw);
    loop {
        let stripped = strip_one_prefix(&text);
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text.trim().to_string()
}

fn collapse_to_last_line(raw: &str) -> String {
    let non_empty: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    match non_empty.last() {
        Some(line) => line.to_string(),
        None => String::new(),
    }
}

fn strip_one_prefix(text: &str) -> String {
    let trimmed = text.trim_start();
    for prefix in PREFIX_RULES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace()).to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_note_prefix() {
        assert_eq!(clean_translation_output("Note: こんにちは"), "こんにちは");
    }

    #[test]
    fn strips_lets_output_prefix() {
        assert_eq!(clean_translation_output("Let's output こんにちは、世界。"), "こんにちは、世界。");
    }

    #[test]
    fn collapses_multiline_preamble_to_last_line() {
        let raw = "Hmm, tricky sentence.\nI'll choose a literal rendering.\nこんにちは、世界。";
        assert_eq!(clean_translation_output(raw), "こんにちは、世界。");
    }

    #[test]
    fn leaves_clean_text_untouched() {
        assert_eq!(clean_translation_output("こんにちは、世界。"), "こんにちは、世界。");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(clean_translation_output(""), "");
        assert_eq!(clean_translation_output("   \n  \n"), "");
    }
}
