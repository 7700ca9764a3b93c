//! Progressive, periodic and final summarization (§4.9).

use std::collections::HashSet;

use crate::config::SummarizationConfig;
use crate::llm::{ModelRequest, ReasoningEffort, TranslationModel};
use crate::translation::cleaning::clean_translation_output;
use crate::translation::prompts::{system_prompt, Purpose};

use super::vocabulary::{parse_vocabulary, VocabularyItem};
use super::word_count::{count_words, take_first_n_words};

use futures_util::StreamExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Progressive,
    Periodic,
    Final,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub kind: SummaryKind,
    pub threshold: Option<u32>,
    pub source_text: String,
    pub target_text: String,
    pub word_count: u32,
    pub start_ts: u64,
    pub end_ts: u64,
}

/// Maintains the running finalized-text buffer and fires progressive,
/// periodic, and final summaries against a streaming model.
pub struct SummarizationEngine<M: TranslationModel> {
    config: SummarizationConfig,
    model: M,
    all_text: Vec<String>,
    periodic_buffer: Vec<String>,
    cumulative_words: u32,
    fired_thresholds: HashSet<u32>,
    emitted: Vec<SummaryRecord>,
    session_start_ts: Option<u64>,
}

impl<M: TranslationModel + Send + Sync> SummarizationEngine<M> {
    pub fn new(config: SummarizationConfig, model: M) -> Self {
        Self {
            config,
            model,
            all_text: Vec::new(),
            periodic_buffer: Vec::new(),
            cumulative_words: 0,
            fired_thresholds: HashSet::new(),
            emitted: Vec::new(),
            session_start_ts: None,
        }
    }

    pub fn emitted_summaries(&self) -> &[SummaryRecord] {
        &self.emitted
    }

    pub fn word_count(&self) -> u32 {
        self.cumulative_words
    }

    /// Discard all accumulated text, fired thresholds, and emitted
    /// summaries, as if the session had just started (§8, `clear-history`).
    pub fn reset(&mut self) {
        self.all_text.clear();
        self.periodic_buffer.clear();
        self.cumulative_words = 0;
        self.fired_thresholds.clear();
        self.emitted.clear();
        self.session_start_ts = None;
    }

    /// Feed one chunk of finalized source-language text. Returns a
    /// progressive summary if this chunk crosses an unfired threshold.
    pub async fn add_final_text(
        &mut self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        now_ms: u64,
    ) -> Option<SummaryRecord> {
        if self.session_start_ts.is_none() {
            self.session_start_ts = Some(now_ms);
        }
        self.all_text.push(text.to_string());
        self.periodic_buffer.push(text.to_string());
        self.cumulative_words += count_words(text, source_lang) as u32;

        let thresholds = self.config.progressive_thresholds.clone();
        for threshold in thresholds {
            if self.cumulative_words >= threshold && !self.fired_thresholds.contains(&threshold) {
                self.fired_thresholds.insert(threshold);
                let slice = take_first_n_words(&self.all_text.join(" "), threshold, source_lang);
                let record = self
                    .build_summary(SummaryKind::Progressive, Some(threshold), &slice, source_lang, target_lang, now_ms)
                    .await;
                self.emitted.push(record.clone());
                return Some(record);
            }
        }
        None
    }

    /// Fire a periodic summary over whatever has accumulated since the
    /// last one, clearing the periodic buffer afterward. No-op if empty.
    pub async fn maybe_periodic(&mut self, source_lang: &str, target_lang: &str, now_ms: u64) -> Option<SummaryRecord> {
        if self.periodic_buffer.is_empty() {
            return None;
        }
        let source_text = self.periodic_buffer.join(" ");
        self.periodic_buffer.clear();
        let record = self.build_summary(SummaryKind::Periodic, None, &source_text, source_lang, target_lang, now_ms).await;
        self.emitted.push(record.clone());
        Some(record)
    }

    /// Produce a final summary of untriggered content on stop, if any
    /// remains (§4.9).
    pub async fn final_summary(&mut self, source_lang: &str, target_lang: &str, now_ms: u64) -> Option<SummaryRecord> {
        if self.periodic_buffer.is_empty() {
            return None;
        }
        let source_text = self.periodic_buffer.join(" ");
        self.periodic_buffer.clear();
        let record = self.build_summary(SummaryKind::Final, None, &source_text, source_lang, target_lang, now_ms).await;
        self.emitted.push(record.clone());
        Some(record)
    }

    /// Extract up to 10 salient terms from everything finalized so far.
    pub async fn extract_vocabulary(&self, source_lang: &str) -> Vec<VocabularyItem> {
        let source_text = self.all_text.join(" ");
        if source_text.trim().is_empty() {
            return Vec::new();
        }
        match self.call_model(&source_text, source_lang, source_lang, Purpose::Vocabulary, ReasoningEffort::Low, 512).await {
            Ok(raw) => parse_vocabulary(&raw),
            Err(_) => Vec::new(),
        }
    }

    /// Compose a Markdown final report from all finalized text, every
    /// emitted summary (target-language), and a fresh vocabulary list.
    pub async fn final_report(&self, source_lang: &str, target_lang: &str) -> Result<String, crate::llm::ModelError> {
        let vocabulary = self.extract_vocabulary(source_lang).await;
        let transcript = self.all_text.join(" ");
        let summaries_text = self
            .emitted
            .iter()
            .map(|s| format!("- {}", s.target_text))
            .collect::<Vec<_>>()
            .join("\n");
        let vocabulary_text =
            vocabulary.iter().map(|v| format!("- {}: {}", v.term, v.definition)).collect::<Vec<_>>().join("\n");

        let user_content = format!(
            "Transcript:\n{transcript}\n\nSummaries:\n{summaries_text}\n\nVocabulary:\n{vocabulary_text}"
        );
        self.call_model(&user_content, source_lang, target_lang, Purpose::Report, ReasoningEffort::High, 4_096).await
    }

    async fn build_summary(
        &self,
        kind: SummaryKind,
        threshold: Option<u32>,
        source_content: &str,
        source_lang: &str,
        target_lang: &str,
        now_ms: u64,
    ) -> SummaryRecord {
        let source_summary = self
            .call_model(source_content, source_lang, source_lang, Purpose::Summary, ReasoningEffort::Low, 512)
            .await
            .unwrap_or_default();

        let target_text = if source_lang != target_lang {
            self.call_model(&source_summary, source_lang, target_lang, Purpose::History, ReasoningEffort::Minimal, 512)
                .await
                .unwrap_or_else(|_| source_summary.clone())
        } else {
            source_summary.clone()
        };

        SummaryRecord {
            kind,
            threshold,
            source_text: source_summary,
            target_text,
            word_count: count_words(source_content, source_lang) as u32,
            start_ts: self.session_start_ts.unwrap_or(now_ms),
            end_ts: now_ms,
        }
    }

    async fn call_model(
        &self,
        content: &str,
        source_lang: &str,
        target_lang: &str,
        purpose: Purpose,
        effort: ReasoningEffort,
        max_output_tokens: u32,
    ) -> Result<String, crate::llm::ModelError> {
        let request = ModelRequest {
            system_prompt: system_prompt(source_lang, target_lang, purpose),
            user_content: content.to_string(),
            max_output_tokens,
            reasoning_effort: effort,
        };
        let mut stream = self.model.stream(request).await?;
        let mut accumulated = String::new();
        while let Some(delta) = stream.next().await {
            accumulated.push_str(&delta?);
        }
        Ok(clean_translation_output(&accumulated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockModel;

    fn config() -> SummarizationConfig {
        SummarizationConfig { progressive_thresholds: vec![4, 8], summary_interval_ms: 600_000 }
    }

    #[tokio::test]
    async fn fires_progressive_summary_on_crossing_threshold() {
        let model = MockModel::new(vec!["A concise summary."]);
        let mut engine = SummarizationEngine::new(config(), model);
        assert!(engine.add_final_text("one two", "en", "en", 0).await.is_none());
        let record = engine.add_final_text("three four five", "en", "en", 100).await.unwrap();
        assert_eq!(record.kind, SummaryKind::Progressive);
        assert_eq!(record.threshold, Some(4));
        assert_eq!(engine.emitted_summaries().len(), 1);
    }

    #[tokio::test]
    async fn each_threshold_fires_at_most_once() {
        let model = MockModel::new(vec!["Summary."]);
        let mut engine = SummarizationEngine::new(config(), model);
        engine.add_final_text("one two three four", "en", "en", 0).await;
        let second = engine.add_final_text("five", "en", "en", 10).await;
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn periodic_summary_drains_and_clears_the_buffer() {
        let model = MockModel::new(vec!["Summary."]);
        let mut engine = SummarizationEngine::new(config(), model);
        engine.add_final_text("some text", "en", "en", 0).await;
        let record = engine.maybe_periodic("en", "en", 1_000).await.unwrap();
        assert_eq!(record.kind, SummaryKind::Periodic);
        assert!(engine.maybe_periodic("en", "en", 2_000).await.is_none());
    }

    #[tokio::test]
    async fn final_summary_is_none_when_nothing_pending() {
        let model = MockModel::new(vec!["Summary."]);
        let mut engine = SummarizationEngine::new(config(), model);
        assert!(engine.final_summary("en", "en", 0).await.is_none());
    }

    #[tokio::test]
    async fn reset_clears_accumulated_text_and_emitted_summaries() {
        let model = MockModel::new(vec!["Summary."]);
        let mut engine = SummarizationEngine::new(config(), model);
        engine.add_final_text("one two three four", "en", "en", 0).await;
        assert_eq!(engine.word_count(), 4);
        assert_eq!(engine.emitted_summaries().len(), 1);

        engine.reset();
        assert_eq!(engine.word_count(), 0);
        assert!(engine.emitted_summaries().is_empty());
        assert!(engine.final_summary("en", "en", 0).await.is_none());
    }
}
