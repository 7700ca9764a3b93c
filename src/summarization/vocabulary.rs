//! Vocabulary extraction output parsing (§4.9): model output is JSON,
//! with a fallback to pulling the first `[...]` substring; invalid
//! output yields an empty list rather than an error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub term: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

pub fn parse_vocabulary(raw: &str) -> Vec<VocabularyItem> {
    if let Ok(items) = serde_json::from_str::<Vec<VocabularyItem>>(raw.trim()) {
        return items.into_iter().take(10).collect();
    }
    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if end > start {
            if let Ok(items) = serde_json::from_str::<Vec<VocabularyItem>>(&raw[start..=end]) {
                return items.into_iter().take(10).collect();
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json_array() {
        let raw = r#"[{"term":"entropy","definition":"a measure of disorder"}]"#;
        let items = parse_vocabulary(raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].term, "entropy");
    }

    #[test]
    fn falls_back_to_embedded_array_substring() {
        let raw = "Here is the list:\n[{\"term\":\"entropy\",\"definition\":\"disorder\"}]\nHope that helps.";
        let items = parse_vocabulary(raw);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn invalid_output_yields_empty_list() {
        assert!(parse_vocabulary("not json at all").is_empty());
    }

    #[test]
    fn caps_at_ten_terms() {
        let terms: Vec<String> =
            (0..15).map(|i| format!(r#"{{"term":"t{i}","definition":"d"}}"#)).collect();
        let raw = format!("[{}]", terms.join(","));
        assert_eq!(parse_vocabulary(&raw).len(), 10);
    }
}
