//! Source-language word counting (§4.9): space-separated tokens for
//! space-delimited languages, character count excluding common
//! punctuation for Japanese/Chinese.

fn is_character_counted(lang: &str) -> bool {
    matches!(lang, "ja" | "zh")
}

fn is_common_punctuation(c: char) -> bool {
    matches!(c, '。' | '、' | '!' | '?' | '.' | ',' | '!' | '?' | '"' | '\'' | '(' | ')' | '「' | '」')
}

pub fn count_words(text: &str, lang: &str) -> usize {
    if is_character_counted(lang) {
        text.chars().filter(|c| !c.is_whitespace() && !is_common_punctuation(*c)).count()
    } else {
        text.split_whitespace().count()
    }
}

/// Take the leading `n` source-language words from `text`, respecting
/// the same counting rule as [`count_words`]. Used to slice the exact
/// content a progressive threshold covers.
pub fn take_first_n_words(text: &str, n: u32, lang: &str) -> String {
    if is_character_counted(lang) {
        let mut taken = 0usize;
        let mut out = String::new();
        for c in text.chars() {
            out.push(c);
            if !c.is_whitespace() && !is_common_punctuation(c) {
                taken += 1;
                if taken >= n as usize {
                    break;
                }
            }
        }
        out
    } else {
        text.split_whitespace().take(n as usize).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_space_delimited_words() {
        assert_eq!(count_words("the quick brown fox", "en"), 4);
    }

    #[test]
    fn counts_cjk_characters_excluding_punctuation() {
        assert_eq!(count_words("こんにちは、世界。", "ja"), 7);
    }

    #[test]
    fn takes_leading_n_words_for_space_delimited_text() {
        assert_eq!(take_first_n_words("one two three four", 2, "en"), "one two");
    }
}
