//! Realtime translation tier (§4.3): streams partial deltas as they
//! arrive from the model, then a final cleaned result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::llm::{ModelRequest, ReasoningEffort, TranslationModel};

use super::cleaning::clean_translation_output;
use super::handler::{PartialSink, TranslationHandler};
use super::prompts::{system_prompt, Purpose};
use super::types::{TranslationError, TranslationJob, TranslationResult};

const MAX_OUTPUT_TOKENS: u32 = 256;

/// Streams low-latency partials for in-progress utterances. Every delta
/// is cleaned and re-emitted; `first_paint_ms` is recorded on the first
/// non-empty delta, `complete_ms` once the stream ends (§3, §4.3).
pub struct RealtimeTranslator<M: TranslationModel> {
    model: M,
}

impl<M: TranslationModel> RealtimeTranslator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: TranslationModel + Send + Sync> TranslationHandler for RealtimeTranslator<M> {
    async fn handle(
        &self,
        job: TranslationJob,
        partials: Option<PartialSink>,
    ) -> Result<TranslationResult, TranslationError> {
        let started = Instant::now();
        let request = ModelRequest {
            system_prompt: system_prompt(&job.source_lang, &job.target_lang, Purpose::Realtime),
            user_content: job.original_text.clone(),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            reasoning_effort: ReasoningEffort::Minimal,
        };

        let mut stream = self
            .model
            .stream(request)
            .await
            .map_err(|e| TranslationError::ModelError { message: e.to_string() })?;

        let first_paint_ms = AtomicU64::new(0);
        let mut accumulated = String::new();

        while let Some(delta) = stream.next().await {
            let delta = delta.map_err(|e| TranslationError::ModelError { message: e.to_string() })?;
            if delta.is_empty() {
                continue;
            }
            accumulated.push_str(&delta);
            if first_paint_ms.load(Ordering::Relaxed) == 0 {
                first_paint_ms.store(started.elapsed().as_millis() as u64 + 1, Ordering::Relaxed);
            }
            if let Some(sink) = &partials {
                sink.send(TranslationResult {
                    segment_id: job.segment_id.clone(),
                    source_text: job.original_text.clone(),
                    target_text: clean_translation_output(&accumulated),
                    confidence: 0.0,
                    first_paint_ms: Some(first_paint_ms.load(Ordering::Relaxed).saturating_sub(1)),
                    complete_ms: None,
                    is_final: false,
                });
            }
        }

        let cleaned = clean_translation_output(&accumulated);
        let first_paint = first_paint_ms.load(Ordering::Relaxed);
        Ok(TranslationResult {
            segment_id: job.segment_id,
            source_text: job.original_text,
            target_text: cleaned,
            confidence: 1.0,
            first_paint_ms: if first_paint == 0 { None } else { Some(first_paint - 1) },
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
    use tokio::sync::mpsc;

    fn job() -> TranslationJob {
        TranslationJob {
            segment_id: "seg-1".into(),
            original_text: "Hello, world.".into(),
            source_lang: "en".into(),
            target_lang: "ja".into(),
            enqueued_at: 0,
            priority: Priority::High,
            kind: JobKind::Realtime,
        }
    }

    #[tokio::test]
    async fn streams_partials_then_a_cleaned_final() {
        let model = MockModel::new(vec!["Note: ", "こんにちは、", "世界。"]);
        let translator = RealtimeTranslator::new(model);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = translator.handle(job(), Some(PartialSink(tx))).await.unwrap();
        assert_eq!(result.target_text, "世界。");
        assert!(result.is_final);
        assert!(result.complete_ms.is_some());

        let mut partial_count = 0;
        while rx.try_recv().is_ok() {
            partial_count += 1;
        }
        assert!(partial_count >= 1);
    }

    #[tokio::test]
    async fn model_failure_surfaces_as_model_error() {
        let model = MockModel::failing();
        let translator = RealtimeTranslator::new(model);
        let result = translator.handle(job(), None).await;
        assert!(matches!(result, Err(TranslationError::ModelError { .. })));
    }
}
