//! Combine consecutive final ASR segments into complete sentences (§4.5).
//!
//! A small struct holding rolling state behind plain fields, advanced by
//! `add_segment`, with an explicit `force_emit` escape hatch for
//! orchestrator-driven timeouts rather than an internal timer.

use crate::asr::TranscriptSegment;
use crate::config::SentenceCombinerConfig;

/// A sentence assembled from one or more finalized ASR segments.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSentence {
    pub id: String,
    pub text: String,
    pub segment_ids: Vec<String>,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
}

struct Pending {
    segment_ids: Vec<String>,
    text_parts: Vec<String>,
    start_ms: Option<u64>,
    end_ms: Option<u64>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.segment_ids.is_empty()
    }
}

/// Accumulates finalized ASR segments until a terminator, the maximum
/// segment count, or an external inactivity timeout closes the sentence.
pub struct SentenceCombiner {
    config: SentenceCombinerConfig,
    pending: Pending,
    next_id: u64,
}

impl SentenceCombiner {
    pub fn new(config: SentenceCombinerConfig) -> Self {
        Self {
            config,
            pending: Pending { segment_ids: Vec::new(), text_parts: Vec::new(), start_ms: None, end_ms: None },
            next_id: 0,
        }
    }

    /// Feed one finalized segment. Returns a completed sentence if this
    /// segment closes one: either it ends with a configured terminator
    /// and the buffer has reached `min_segments`, or the buffer has
    /// reached `max_segments` regardless of terminator (§4.5).
    pub fn add_segment(&mut self, segment: &TranscriptSegment) -> Option<CombinedSentence> {
        if !segment.is_final || segment.text.trim().is_empty() {
            return None;
        }

        if self.pending.start_ms.is_none() {
            self.pending.start_ms = segment.start_ms;
        }
        self.pending.end_ms = segment.end_ms;
        self.pending.segment_ids.push(segment.id.clone());
        self.pending.text_parts.push(segment.text.clone());

        let ends_with_terminator = segment
            .text
            .trim_end()
            .chars()
            .last()
            .map(|c| self.config.terminators.contains(&c))
            .unwrap_or(false);

        let reached_min = self.pending.segment_ids.len() >= self.config.min_segments;
        let reached_max = self.pending.segment_ids.len() >= self.config.max_segments;

        if (ends_with_terminator && reached_min) || reached_max {
            return Some(self.emit());
        }
        None
    }

    /// Flush whatever is buffered regardless of terminator/min_segments,
    /// for use when the inactivity timeout elapses (§4.5).
    pub fn force_emit(&mut self) -> Option<CombinedSentence> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.emit())
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    fn emit(&mut self) -> CombinedSentence {
        self.next_id += 1;
        let pending = std::mem::replace(
            &mut self.pending,
            Pending { segment_ids: Vec::new(), text_parts: Vec::new(), start_ms: None, end_ms: None },
        );
        CombinedSentence {
            id: format!("cs_{}", self.next_id),
            text: pending.text_parts.join(" "),
            segment_ids: pending.segment_ids,
            start_ms: pending.start_ms,
            end_ms: pending.end_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: &str, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id: id.into(),
            text: text.into(),
            confidence: 0.9,
            is_final: true,
            start_ms: Some(0),
            end_ms: Some(100),
            received_at: 0,
        }
    }

    #[test]
    fn emits_on_terminator_once_min_segments_reached() {
        let mut combiner = SentenceCombiner::new(SentenceCombinerConfig {
            max_segments: 10,
            min_segments: 2,
            timeout_ms: 2_000,
            terminators: vec!['.'],
        });
        assert!(combiner.add_segment(&seg("s1", "Hello")).is_none());
        let sentence = combiner.add_segment(&seg("s2", "world.")).unwrap();
        assert_eq!(sentence.text, "Hello world.");
        assert_eq!(sentence.segment_ids, vec!["s1", "s2"]);
        assert!(combiner.is_idle());
    }

    #[test]
    fn force_splits_at_max_segments_without_terminator() {
        let mut combiner = SentenceCombiner::new(SentenceCombinerConfig {
            max_segments: 2,
            min_segments: 1,
            timeout_ms: 2_000,
            terminators: vec!['.'],
        });
        assert!(combiner.add_segment(&seg("s1", "one")).is_none());
        let sentence = combiner.add_segment(&seg("s2", "two")).unwrap();
        assert_eq!(sentence.text, "one two");
    }

    #[test]
    fn force_emit_flushes_partial_buffer() {
        let mut combiner = SentenceCombiner::new(SentenceCombinerConfig {
            max_segments: 10,
            min_segments: 3,
            timeout_ms: 2_000,
            terminators: vec!['.'],
        });
        combiner.add_segment(&seg("s1", "hanging thought"));
        let sentence = combiner.force_emit().unwrap();
        assert_eq!(sentence.text, "hanging thought");
        assert!(combiner.force_emit().is_none());
    }

    #[test]
    fn empty_and_interim_segments_are_ignored() {
        let mut combiner = SentenceCombiner::new(SentenceCombinerConfig {
            max_segments: 10,
            min_segments: 1,
            timeout_ms: 2_000,
            terminators: vec!['.'],
        });
        let mut interim = seg("s1", "partial");
        interim.is_final = false;
        assert!(combiner.add_segment(&interim).is_none());
        assert!(combiner.add_segment(&seg("s2", "   ")).is_none());
        assert!(combiner.is_idle());
    }
}
