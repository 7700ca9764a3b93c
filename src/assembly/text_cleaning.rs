//! Pure text-cleaning helpers shared by paragraph assembly (§4.6).

/// Strip filler phrases, collapse whitespace, drop consecutive duplicate
/// words, and capitalize the first letter of each sentence.
pub fn clean_paragraph_text(raw: &str, filler_tokens: &[String]) -> String {
    let mut text = raw.to_string();
    let mut fillers: Vec<&String> = filler_tokens.iter().collect();
    fillers.sort_by_key(|f| std::cmp::Reverse(f.len()));
    for filler in fillers {
        text = remove_phrase_case_insensitive(&text, filler);
    }
    let text = collapse_whitespace(&text);
    let text = dedup_consecutive_words(&text);
    capitalize_first(&text)
}

fn remove_phrase_case_insensitive(text: &str, phrase: &str) -> String {
    if phrase.is_empty() {
        return text.to_string();
    }
    let lower_text = text.to_lowercase();
    let lower_phrase = phrase.to_lowercase();
    let mut result = String::new();
    let mut last = 0;
    let mut search_from = 0;
    while let Some(pos) = lower_text[search_from..].find(&lower_phrase) {
        let start = search_from + pos;
        let end = start + lower_phrase.len();
        result.push_str(&text[last..start]);
        last = end;
        search_from = end;
    }
    result.push_str(&text[last..]);
    result
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn dedup_consecutive_words(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if out.last().map(|w: &&str| w.eq_ignore_ascii_case(word)).unwrap_or(false) {
            continue;
        }
        out.push(word);
    }
    out.join(" ")
}

const SENTENCE_TERMINATORS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Capitalize the first letter of the text and the first letter following
/// each sentence terminator.
fn capitalize_first(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut capitalize_next = true;
    for ch in text.chars() {
        if capitalize_next && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(ch);
            if SENTENCE_TERMINATORS.contains(&ch) {
                capitalize_next = true;
            } else if !ch.is_whitespace() {
                capitalize_next = false;
            }
        }
    }
    out
}
