//! Session-wide pipeline configuration.
//!
//! A single [`PipelineConfig`] is constructed once by the host application
//! and handed to the orchestrator; it is immutable for the lifetime of the
//! session. Each nested struct mirrors one component and carries its own
//! literal defaults via `Default`, one struct per concern.

use serde::{Deserialize, Serialize};

/// Top-level configuration handed to [`crate::orchestrator::PipelineOrchestrator::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub asr: AsrConfig,
    pub queue: QueueConfig,
    pub sentence_combiner: SentenceCombinerConfig,
    pub paragraph_builder: ParagraphBuilderConfig,
    pub display: DisplayModelConfig,
    pub history_grouper: HistoryGrouperConfig,
    pub summarization: SummarizationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            asr: AsrConfig::default(),
            queue: QueueConfig::default(),
            sentence_combiner: SentenceCombinerConfig::default(),
            paragraph_builder: ParagraphBuilderConfig::default(),
            display: DisplayModelConfig::default(),
            history_grouper: HistoryGrouperConfig::default(),
            summarization: SummarizationConfig::default(),
        }
    }
}

/// ASR transport tuning (§4.1, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    pub sample_rate: u32,
    pub channels: u8,
    pub frame_bytes: usize,
    pub keepalive_ms: u64,
    pub max_reconnect_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_factor: f64,
    pub backoff_max_ms: u64,
    pub backoff_jitter: f64,
    pub endpointing_ms: u64,
    pub utterance_end_ms: u64,
    pub smart_format: bool,
    /// Bounded ring buffer capacity for undelivered PCM frames; when full
    /// the oldest frame is dropped (§4.1, §5 back-pressure).
    pub audio_ring_capacity: usize,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            frame_bytes: 640,
            keepalive_ms: 5_000,
            max_reconnect_attempts: 5,
            backoff_base_ms: 1_000,
            backoff_factor: 2.0,
            backoff_max_ms: 10_000,
            backoff_jitter: 0.2,
            endpointing_ms: 800,
            utterance_end_ms: 1_000,
            smart_format: true,
            audio_ring_capacity: 64,
        }
    }
}

/// Translation queue tuning (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub max_queue: usize,
    pub max_concurrency: usize,
    pub request_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue: 100,
            max_concurrency: 3,
            request_timeout_ms: 30_000,
        }
    }
}

/// Sentence combiner tuning (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceCombinerConfig {
    pub max_segments: usize,
    pub min_segments: usize,
    pub timeout_ms: u64,
    pub terminators: Vec<char>,
}

impl Default for SentenceCombinerConfig {
    fn default() -> Self {
        Self {
            max_segments: 10,
            min_segments: 1,
            timeout_ms: 2_000,
            terminators: vec!['.', '!', '?', '。', '!', '?'],
        }
    }
}

/// Paragraph builder tuning (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphBuilderConfig {
    pub min_chunks: usize,
    pub max_duration_ms: u64,
    pub silence_threshold_ms: u64,
    pub discourse_cues: Vec<String>,
    pub terminators: Vec<char>,
    pub filler_tokens: Vec<String>,
}

impl Default for ParagraphBuilderConfig {
    fn default() -> Self {
        Self {
            min_chunks: 15,
            max_duration_ms: 60_000,
            silence_threshold_ms: 3_000,
            discourse_cues: vec![
                "so".into(),
                "now".into(),
                "next".into(),
                "okay".into(),
                "let's".into(),
                "moving on".into(),
                "in conclusion".into(),
            ],
            terminators: vec!['.', '!', '?', '。', '!', '?'],
            filler_tokens: vec![
                "um".into(),
                "uh".into(),
                "ah".into(),
                "er".into(),
                "like".into(),
                "you know".into(),
                "i mean".into(),
                "sort of".into(),
                "kind of".into(),
            ],
        }
    }
}

/// Realtime display model tuning (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayModelConfig {
    pub translation_hold_ms: u64,
    pub min_display_ms: u64,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    pub opacity_recent: f32,
    pub opacity_older: f32,
    pub opacity_oldest_min: f32,
    pub opacity_oldest_max: f32,
}

impl Default for DisplayModelConfig {
    fn default() -> Self {
        Self {
            translation_hold_ms: 1_500,
            min_display_ms: 1_500,
            fade_in_ms: 200,
            fade_out_ms: 300,
            opacity_recent: 1.0,
            opacity_older: 0.6,
            opacity_oldest_min: 0.3,
            opacity_oldest_max: 0.4,
        }
    }
}

/// History grouper tuning (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryGrouperConfig {
    pub min_sentences_per_block: usize,
    pub max_sentences_per_block: usize,
    pub natural_break_gap_ms: u64,
    pub chars_per_line: usize,
    pub line_height: f32,
    pub padding: f32,
}

impl Default for HistoryGrouperConfig {
    fn default() -> Self {
        Self {
            min_sentences_per_block: 3,
            max_sentences_per_block: 5,
            natural_break_gap_ms: 3_000,
            chars_per_line: 40,
            line_height: 24.0,
            padding: 16.0,
        }
    }
}

/// Summarization engine tuning (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationConfig {
    pub progressive_thresholds: Vec<u32>,
    pub summary_interval_ms: u64,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            progressive_thresholds: vec![400, 800, 1600, 2400],
            summary_interval_ms: 600_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_literals() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.asr.keepalive_ms, 5_000);
        assert_eq!(cfg.queue.max_queue, 100);
        assert_eq!(cfg.queue.max_concurrency, 3);
        assert_eq!(cfg.sentence_combiner.max_segments, 10);
        assert_eq!(cfg.paragraph_builder.min_chunks, 15);
        assert_eq!(cfg.display.translation_hold_ms, 1_500);
        assert_eq!(cfg.history_grouper.max_sentences_per_block, 5);
        assert_eq!(cfg.summarization.progressive_thresholds, vec![400, 800, 1600, 2400]);
    }
}
