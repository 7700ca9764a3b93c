//! The outbound event stream (§6): a single tagged union, kebab-case on
//! the wire, every event carrying `correlation_id` and `emitted_at`.

use serde::{Deserialize, Serialize};

use crate::summarization::VocabularyItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItemPayload {
    pub sentence_id: String,
    pub original: String,
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OutboundEvent {
    Asr {
        text: String,
        confidence: f32,
        is_final: bool,
        language: String,
        segment_id: String,
    },
    Translation {
        original_text: String,
        translated_text: String,
        source_language: String,
        target_language: String,
        confidence: f32,
        is_final: bool,
        segment_id: String,
    },
    CombinedSentence {
        combined_id: String,
        segment_ids: Vec<String>,
        original_text: String,
        timestamp: u64,
        end_timestamp: u64,
        segment_count: usize,
    },
    ParagraphComplete {
        paragraph_id: String,
        segment_ids: Vec<String>,
        raw_text: String,
        cleaned_text: String,
        start_time: u64,
        end_time: u64,
        duration_ms: u64,
        word_count: u32,
    },
    HistoryBlock {
        block_id: String,
        block_kind: String,
        items: Vec<HistoryItemPayload>,
        height: f32,
    },
    HistoryBlockUpdated {
        block_id: String,
        sentence_id: String,
        translation: String,
        height: f32,
    },
    Summary {
        summary_kind: String,
        threshold: Option<u32>,
        source_text: String,
        target_text: String,
        word_count: u32,
        start_ts: u64,
        end_ts: u64,
    },
    Vocabulary {
        items: Vec<VocabularyItem>,
        total_terms: usize,
    },
    FinalReport {
        report_markdown: String,
        total_word_count: u32,
        summary_count: usize,
        vocabulary_count: usize,
    },
    Status {
        state: String,
        previous_state: String,
        uptime_ms: u64,
    },
    Error {
        code: String,
        message: String,
        recoverable: bool,
        details: Option<String>,
    },
}

/// Every outbound event wears this envelope: a correlation id threading
/// a whole session's events together, and a monotonic emission
/// timestamp consumers must not reorder (§5, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub correlation_id: String,
    pub emitted_at: u64,
    #[serde(flatten)]
    pub event: OutboundEvent,
}

impl EventEnvelope {
    pub fn new(correlation_id: impl Into<String>, emitted_at: u64, event: OutboundEvent) -> Self {
        Self { correlation_id: correlation_id.into(), emitted_at, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kebab_case_tag_and_flattened_envelope() {
        let envelope = EventEnvelope::new(
            "c1",
            100,
            OutboundEvent::Status { state: "listening".into(), previous_state: "starting".into(), uptime_ms: 10 },
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["kind"], "status");
        assert_eq!(json["correlation_id"], "c1");
        assert_eq!(json["state"], "listening");
    }
}
