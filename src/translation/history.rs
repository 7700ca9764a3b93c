//! History translation tier (§4.4): single-shot, fidelity-first
//! translation with no partial emission. Also serves the
//! `translate-user-input` command (manual translation requests bypass
//! the queue's segment-id dedup, since user input carries no segment_id).

use std::time::Instant;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::llm::{ModelRequest, ReasoningEffort, TranslationModel};

use super::cleaning::clean_translation_output;
use super::handler::{PartialSink, TranslationHandler};
use super::prompts::{system_prompt, Purpose};
use super::types::{TranslationError, TranslationJob, TranslationResult};

const MAX_OUTPUT_TOKENS: u32 = 512;

pub struct HistoryTranslator<M: TranslationModel> {
    model: M,
}

impl<M: TranslationModel> HistoryTranslator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Translate arbitrary ad-hoc text outside the queue, for the
    /// `translate-user-input` command.
    pub async fn translate_text(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslationError> {
        let raw = self.collect(text, source_lang, target_lang).await?;
        Ok(clean_translation_output(&raw))
    }

    async fn collect(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String, TranslationError> {
        let request = ModelRequest {
            system_prompt: system_prompt(source_lang, target_lang, Purpose::History),
            user_content: text.to_string(),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            reasoning_effort: ReasoningEffort::Low,
        };
        let mut stream = self
            .model
            .stream(request)
            .await
            .map_err(|e| TranslationError::ModelError { message: e.to_string() })?;

        let mut accumulated = String::new();
        while let Some(delta) = stream.next().await {
            let delta = delta.map_err(|e| TranslationError::ModelError { message: e.to_string() })?;
            accumulated.push_str(&delta);
        }
        Ok(accumulated)
    }
}

#[async_trait]
impl<M: TranslationModel + Send + Sync> TranslationHandler for HistoryTranslator<M> {
    async fn handle(
        &self,
        job: TranslationJob,
        _partials: Option<PartialSink>,
    ) -> Result<TranslationResult, TranslationError> {
        let started = Instant::now();
        let raw = self.collect(&job.original_text, &job.source_lang, &job.target_lang).await?;
        let cleaned = clean_translation_output(&raw);
        Ok(TranslationResult {
            segment_id: job.segment_id,
            source_text: job.original_text,
            target_text: cleaned,
            confidence: 1.0,
            first_paint_ms: None,
            complete_ms: Some(started.elapsed().as_millis() as u64),
            is_final: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockModel;
    use crate::translation::types::{JobKind, Priority};

    fn job() -> TranslationJob {
        TranslationJob {
            segment_id: "history_1".into(),
            original_text: "This concludes today's lecture.".into(),
            source_lang: "en".into(),
            target_lang: "ja".into(),
            enqueued_at: 0,
            priority: Priority::Normal,
            kind: JobKind::History,
        }
    }

    #[tokio::test]
    async fn produces_a_single_final_result_with_no_partials() {
        let model = MockModel::new(vec!["本日の講義はこれで終了です。"]);
        let translator = HistoryTranslator::new(model);
        let result = translator.handle(job(), None).await.unwrap();
        assert!(result.is_final);
        assert!(result.first_paint_ms.is_none());
        assert_eq!(result.target_text, "本日の講義はこれで終了です。");
    }

    #[tokio::test]
    async fn translate_text_serves_ad_hoc_user_input() {
        let model = MockModel::new(vec!["Hmm, ", "Bonjour."]);
        let translator = HistoryTranslator::new(model);
        let translated = translator.translate_text("Hello.", "en", "fr").await.unwrap();
        assert_eq!(translated, "Bonjour.");
    }
}
