//! Leading-token similarity scoring used by the three-line display's
//! interim dedup and translation-pairing heuristics (§4.7).

/// Score how similar two strings are by comparing leading whitespace
/// tokens. 3+ matching leading tokens score 0.95, 2 score 0.9, a single
/// matching token followed by a prefix-containment relationship on the
/// next token scores 0.9, a single matching token alone scores 0.85, and
/// anything else scores 0.3 or lower.
pub fn leading_token_similarity(a: &str, b: &str) -> f32 {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();

    let common = tokens_a
        .iter()
        .zip(tokens_b.iter())
        .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
        .count();

    if common >= 3 {
        return 0.95;
    }
    if common == 2 {
        return 0.9;
    }
    if common == 1 {
        let next_a = tokens_a.get(1).copied().unwrap_or("");
        let next_b = tokens_b.get(1).copied().unwrap_or("");
        if !next_a.is_empty() && !next_b.is_empty() && (next_a.starts_with(next_b) || next_b.starts_with(next_a)) {
            return 0.9;
        }
        return 0.85;
    }

    if tokens_a.first().zip(tokens_b.first()).map(|(x, y)| char_prefix_len(x, y) > 0).unwrap_or(false) {
        0.3
    } else {
        0.0
    }
}

fn char_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x.eq_ignore_ascii_case(y)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_or_more_leading_tokens_score_high() {
        assert_eq!(leading_token_similarity("Life asks us", "Life asks us to wait."), 0.95);
    }

    #[test]
    fn two_leading_tokens_score_point_nine() {
        assert_eq!(leading_token_similarity("Life asks", "Life asks us"), 0.9);
    }

    #[test]
    fn one_token_with_prefix_containment_scores_point_nine() {
        assert_eq!(leading_token_similarity("Life ask", "Life asks"), 0.9);
    }

    #[test]
    fn one_token_without_containment_scores_point_eight_five() {
        assert_eq!(leading_token_similarity("Life", "Life waits"), 0.85);
    }

    #[test]
    fn unrelated_text_scores_low() {
        assert_eq!(leading_token_similarity("Hello world", "Completely different"), 0.0);
    }
}
