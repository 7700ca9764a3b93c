//! Group combined sentences into paragraphs (§4.6).
//!
//! A paragraph closes on whichever comes first: enough sentences plus a
//! terminator, a silence gap or discourse cue signalling a new topic, or
//! the maximum duration being exceeded. Timestamps are caller-supplied
//! milliseconds rather than wall-clock `Instant`s, so tests can drive the
//! builder deterministically.

use crate::assembly::sentence_combiner::CombinedSentence;
use crate::assembly::text_cleaning::clean_paragraph_text;
use crate::config::ParagraphBuilderConfig;

/// A finished paragraph, with both the raw concatenation and a cleaned
/// rendering (filler words stripped, duplicates collapsed) for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub id: String,
    pub raw_text: String,
    pub cleaned_text: String,
    pub sentence_ids: Vec<String>,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
}

struct Pending {
    sentences: Vec<CombinedSentence>,
    started_at_ms: Option<u64>,
}

impl Pending {
    fn empty() -> Self {
        Self { sentences: Vec::new(), started_at_ms: None }
    }
}

pub struct ParagraphBuilder {
    config: ParagraphBuilderConfig,
    pending: Pending,
    next_id: u64,
}

impl ParagraphBuilder {
    pub fn new(config: ParagraphBuilderConfig) -> Self {
        Self { config, pending: Pending::empty(), next_id: 0 }
    }

    /// Feed one combined sentence. `now_ms` is the wall-clock time the
    /// sentence arrived, used for both the silence-gap check and the
    /// max-duration check.
    pub fn add_sentence(&mut self, sentence: CombinedSentence, now_ms: u64) -> Option<Paragraph> {
        let begins_new_topic = !self.pending.sentences.is_empty()
            && (self.gap_before(&sentence) >= self.config.silence_threshold_ms
                || starts_with_discourse_cue(&sentence.text, &self.config.discourse_cues));

        if begins_new_topic {
            let paragraph = self.emit();
            self.push(sentence, now_ms);
            return Some(paragraph);
        }

        self.push(sentence, now_ms);

        let reached_min = self.pending.sentences.len() >= self.config.min_chunks;
        let ends_with_terminator = self.last_ends_with_terminator();
        let duration_exceeded = self
            .pending
            .started_at_ms
            .map(|started| now_ms.saturating_sub(started) >= self.config.max_duration_ms)
            .unwrap_or(false);

        if (reached_min && ends_with_terminator) || duration_exceeded {
            return Some(self.emit());
        }
        None
    }

    /// Flush whatever is buffered, for end-of-session or pause handling.
    pub fn flush(&mut self) -> Option<Paragraph> {
        if self.pending.sentences.is_empty() {
            None
        } else {
            Some(self.emit())
        }
    }

    fn gap_before(&self, sentence: &CombinedSentence) -> u64 {
        let last_end = self.pending.sentences.last().and_then(|s| s.end_ms);
        match (last_end, sentence.start_ms) {
            (Some(last_end), Some(start)) => start.saturating_sub(last_end),
            _ => 0,
        }
    }

    fn last_ends_with_terminator(&self) -> bool {
        self.pending
            .sentences
            .last()
            .and_then(|s| s.text.trim_end().chars().last())
            .map(|c| self.config.terminators.contains(&c))
            .unwrap_or(false)
    }

    fn push(&mut self, sentence: CombinedSentence, now_ms: u64) {
        if self.pending.started_at_ms.is_none() {
            self.pending.started_at_ms = Some(now_ms);
        }
        self.pending.sentences.push(sentence);
    }

    fn emit(&mut self) -> Paragraph {
        self.next_id += 1;
        let pending = std::mem::replace(&mut self.pending, Pending::empty());
        let raw_text = pending.sentences.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
        let cleaned_text = clean_paragraph_text(&raw_text, &self.config.filler_tokens);
        let sentence_ids = pending.sentences.iter().map(|s| s.id.clone()).collect();
        let start_ms = pending.sentences.first().and_then(|s| s.start_ms);
        let end_ms = pending.sentences.last().and_then(|s| s.end_ms);
        Paragraph { id: format!("paragraph_{}", self.next_id), raw_text, cleaned_text, sentence_ids, start_ms, end_ms }
    }
}

fn starts_with_discourse_cue(text: &str, cues: &[String]) -> bool {
    let lower = text.trim_start().to_lowercase();
    cues.iter().any(|cue| lower.starts_with(&cue.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(id: &str, text: &str, start_ms: u64, end_ms: u64) -> CombinedSentence {
        CombinedSentence {
            id: id.into(),
            text: text.into(),
            segment_ids: vec![format!("{id}-seg")],
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
        }
    }

    fn config() -> ParagraphBuilderConfig {
        ParagraphBuilderConfig {
            min_chunks: 2,
            max_duration_ms: 60_000,
            silence_threshold_ms: 3_000,
            discourse_cues: vec!["now".into(), "so".into()],
            terminators: vec!['.'],
            filler_tokens: vec!["um".into()],
        }
    }

    #[test]
    fn emits_on_min_chunks_and_terminator() {
        let mut builder = ParagraphBuilder::new(config());
        assert!(builder.add_sentence(sentence("s1", "This is one.", 0, 100), 100).is_none());
        let paragraph = builder.add_sentence(sentence("s2", "um, this is two.", 200, 300), 300).unwrap();
        assert_eq!(paragraph.raw_text, "This is one. um, this is two.");
        assert_eq!(paragraph.cleaned_text, "This is one. , this is two.");
        assert_eq!(paragraph.sentence_ids, vec!["s1", "s2"]);
    }

    #[test]
    fn silence_gap_flushes_the_previous_paragraph() {
        let mut builder = ParagraphBuilder::new(config());
        builder.add_sentence(sentence("s1", "First thought", 0, 1_000), 1_000);
        let paragraph = builder.add_sentence(sentence("s2", "Much later thought", 10_000, 11_000), 10_000).unwrap();
        assert_eq!(paragraph.raw_text, "First thought");
    }

    #[test]
    fn discourse_cue_starts_a_new_paragraph() {
        let mut builder = ParagraphBuilder::new(config());
        builder.add_sentence(sentence("s1", "First thought", 0, 500), 500);
        let paragraph = builder.add_sentence(sentence("s2", "Now for something else", 600, 900), 600).unwrap();
        assert_eq!(paragraph.raw_text, "First thought");
    }

    #[test]
    fn max_duration_forces_a_flush() {
        let mut config = config();
        config.min_chunks = 100;
        let mut builder = ParagraphBuilder::new(config);
        builder.add_sentence(sentence("s1", "Still going", 0, 100), 0);
        let paragraph = builder.add_sentence(sentence("s2", "and going", 200, 300), 61_000).unwrap();
        assert_eq!(paragraph.sentence_ids, vec!["s1", "s2"]);
    }

    #[test]
    fn flush_drains_a_partial_paragraph() {
        let mut builder = ParagraphBuilder::new(config());
        assert!(builder.flush().is_none());
        builder.add_sentence(sentence("s1", "Partial", 0, 100), 100);
        let paragraph = builder.flush().unwrap();
        assert_eq!(paragraph.raw_text, "Partial");
        assert!(builder.flush().is_none());
    }
}
