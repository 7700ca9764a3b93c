//! The session root: owns every component, routes domain events between
//! them, and emits a single correlation-id-stamped outbound stream (§4.11).
//!
//! A root struct owns component handles behind `Arc`/`Mutex`, a spawned
//! background task per long-running concern, and exposes commands as plain
//! async methods rather than a message-passing actor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::asr::{
    AsrAdapterEvent, AsrConnectOptions, AsrStreamAdapter, AsrTransport, TranscriptSegment,
};
use crate::assembly::{CombinedSentence, Paragraph, ParagraphBuilder, SentenceCombiner};
use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::display::RealtimeDisplayModel;
use crate::error::PipelineError;
use crate::events::{EventEnvelope, HistoryItemPayload, OutboundEvent};
use crate::history::{BlockKind, HistoryGrouper, HistoryItem, UpdateOutcome};
use crate::llm::TranslationModel;
use crate::state::{PipelineState, PipelineStateMachine};
use crate::summarization::{SummarizationEngine, SummaryRecord, VocabularyItem};
use crate::translation::{
    HandlerTier, HistoryTranslator, JobKind, Priority, QueueEvent, RealtimeTranslator,
    TranslationJob, TranslationQueue,
};

/// Bound on the outbound event channel; once full, droppable event kinds
/// (interim asr, non-final translation deltas) are dropped rather than
/// applying back-pressure to the producing tasks (§5).
const OUTBOUND_CHANNEL_CAPACITY: usize = 1_024;

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn is_droppable(event: &OutboundEvent) -> bool {
    matches!(
        event,
        OutboundEvent::Asr { is_final: false, .. } | OutboundEvent::Translation { is_final: false, .. }
    )
}

fn state_label(state: PipelineState) -> &'static str {
    match state {
        PipelineState::Idle => "idle",
        PipelineState::Starting => "starting",
        PipelineState::Listening => "listening",
        PipelineState::Processing => "processing",
        PipelineState::Stopping => "stopping",
        PipelineState::Error => "error",
        PipelineState::Paused => "paused",
    }
}

/// Everything the orchestrator's background tasks and command methods
/// share. Split out from [`PipelineOrchestrator`] so spawned tasks can
/// hold an `Arc` clone without cloning the orchestrator itself.
struct Shared<M: TranslationModel> {
    config: PipelineConfig,
    state: Mutex<PipelineStateMachine>,
    asr: tokio::sync::Mutex<AsrStreamAdapter>,
    queue: TranslationQueue,
    combiner: Mutex<SentenceCombiner>,
    paragraphs: Mutex<ParagraphBuilder>,
    display: Mutex<RealtimeDisplayModel>,
    history: Mutex<HistoryGrouper>,
    summarization: tokio::sync::Mutex<SummarizationEngine<M>>,
    model: M,
    outbound_tx: mpsc::Sender<EventEnvelope>,
    langs: Mutex<(String, String)>,
    session_started_at: Mutex<Option<u64>>,
    last_segment_at: Mutex<Option<u64>>,
}

impl<M: TranslationModel + Send + Sync + 'static> Shared<M> {
    async fn publish(&self, event: OutboundEvent) {
        let correlation_id = self.state.lock().unwrap().correlation_id().unwrap_or("").to_string();
        let envelope = EventEnvelope::new(correlation_id, now_ms(), event);
        if is_droppable(&envelope.event) {
            if self.outbound_tx.try_send(envelope).is_err() {
                debug!("dropping outbound event under back-pressure");
            }
        } else if self.outbound_tx.send(envelope).await.is_err() {
            warn!("outbound event receiver dropped");
        }
    }

    fn uptime_ms(&self) -> u64 {
        match *self.session_started_at.lock().unwrap() {
            Some(start) => now_ms().saturating_sub(start),
            None => 0,
        }
    }

    async fn transition(&self, to: PipelineState, reason: Option<String>) -> Result<(), PipelineError> {
        let from = {
            let mut sm = self.state.lock().unwrap();
            let from = sm.state();
            if !sm.transition(to, reason) {
                return Err(PipelineError::InvalidState {
                    message: format!("cannot transition from {from:?} to {to:?}"),
                });
            }
            from
        };
        self.publish(OutboundEvent::Status {
            state: state_label(to).to_string(),
            previous_state: state_label(from).to_string(),
            uptime_ms: self.uptime_ms(),
        })
        .await;
        Ok(())
    }

    fn langs(&self) -> (String, String) {
        self.langs.lock().unwrap().clone()
    }

    /// Feed one finalized transcript segment through the realtime queue
    /// and the sentence/paragraph assembly chain (§4.11).
    async fn handle_final_segment(&self, segment: &TranscriptSegment) {
        let (source_lang, target_lang) = self.langs();
        *self.last_segment_at.lock().unwrap() = Some(now_ms());

        let job = TranslationJob {
            segment_id: segment.id.clone(),
            original_text: segment.text.clone(),
            source_lang: source_lang.clone(),
            target_lang: target_lang.clone(),
            enqueued_at: now_ms(),
            priority: Priority::Normal,
            kind: JobKind::Realtime,
        };
        if let Err(e) = self.queue.enqueue(job) {
            self.publish(OutboundEvent::Error {
                code: "QUEUE_FULL".into(),
                message: e.to_string(),
                recoverable: true,
                details: None,
            })
            .await;
        }

        let combined = self.combiner.lock().unwrap().add_segment(segment);
        if let Some(sentence) = combined {
            self.on_combined_sentence(sentence, &source_lang, &target_lang).await;
        }
    }

    async fn on_combined_sentence(&self, sentence: CombinedSentence, source_lang: &str, target_lang: &str) {
        self.publish(OutboundEvent::CombinedSentence {
            combined_id: sentence.id.clone(),
            segment_ids: sentence.segment_ids.clone(),
            original_text: sentence.text.clone(),
            timestamp: sentence.start_ms.unwrap_or(0),
            end_timestamp: sentence.end_ms.unwrap_or(0),
            segment_count: sentence.segment_ids.len(),
        })
        .await;

        let history_segment_id = format!("history_{}", sentence.id);
        let job = TranslationJob {
            segment_id: history_segment_id,
            original_text: sentence.text.clone(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            enqueued_at: now_ms(),
            priority: Priority::Low,
            kind: JobKind::History,
        };
        if let Err(e) = self.queue.enqueue(job) {
            debug!(error = %e, "history job for combined sentence not enqueued");
        }

        let block = self.history.lock().unwrap().add_sentence(HistoryItem {
            sentence_id: sentence.id.clone(),
            original: sentence.text.clone(),
            translation: None,
            ts: now_ms(),
        });
        if let Some(block) = block {
            self.publish_history_block(&block).await;
        }

        let now = now_ms();
        let paragraph = self.paragraphs.lock().unwrap().add_sentence(sentence, now);
        if let Some(paragraph) = paragraph {
            self.on_paragraph(paragraph, source_lang, target_lang).await;
        }
    }

    async fn on_paragraph(&self, paragraph: Paragraph, source_lang: &str, target_lang: &str) {
        let word_count = crate::summarization::count_words(&paragraph.cleaned_text, source_lang) as u32;
        self.publish(OutboundEvent::ParagraphComplete {
            paragraph_id: paragraph.id.clone(),
            segment_ids: paragraph.sentence_ids.clone(),
            raw_text: paragraph.raw_text.clone(),
            cleaned_text: paragraph.cleaned_text.clone(),
            start_time: paragraph.start_ms.unwrap_or(0),
            end_time: paragraph.end_ms.unwrap_or(0),
            duration_ms: paragraph.end_ms.unwrap_or(0).saturating_sub(paragraph.start_ms.unwrap_or(0)),
            word_count,
        })
        .await;

        let job = TranslationJob {
            segment_id: paragraph.id.clone(),
            original_text: paragraph.cleaned_text.clone(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            enqueued_at: now_ms(),
            priority: Priority::Low,
            kind: JobKind::Paragraph,
        };
        if let Err(e) = self.queue.enqueue(job) {
            debug!(error = %e, "history job for paragraph not enqueued");
        }

        let (flushed, block) = self.history.lock().unwrap().add_paragraph(HistoryItem {
            sentence_id: paragraph.id.clone(),
            original: paragraph.cleaned_text.clone(),
            translation: None,
            ts: now_ms(),
        });
        if let Some(flushed) = flushed {
            self.publish_history_block(&flushed).await;
        }
        self.publish_history_block(&block).await;
    }

    async fn publish_history_block(&self, block: &crate::history::HistoryBlock) {
        let items = block
            .items
            .iter()
            .map(|i| HistoryItemPayload {
                sentence_id: i.sentence_id.clone(),
                original: i.original.clone(),
                translation: i.translation.clone(),
            })
            .collect();
        let block_kind = match block.kind {
            BlockKind::Sentences => "sentences",
            BlockKind::Paragraph => "paragraph",
        };
        self.publish(OutboundEvent::HistoryBlock {
            block_id: block.id.clone(),
            block_kind: block_kind.to_string(),
            items,
            height: block.height,
        })
        .await;
    }

    /// Apply one event surfaced by the translation queue: publish the
    /// `translation` event, and for history-tier results, update the
    /// history grouper and feed the summarization engine (§4.11).
    async fn apply_queue_event(&self, event: QueueEvent) {
        let (source_lang, target_lang) = self.langs();
        match event {
            QueueEvent::Partial(result) => {
                self.display.lock().unwrap().apply_translation_text(&result.target_text, now_ms());
                self.publish(OutboundEvent::Translation {
                    original_text: result.source_text,
                    translated_text: result.target_text,
                    source_language: source_lang,
                    target_language: target_lang,
                    confidence: result.confidence,
                    is_final: false,
                    segment_id: result.segment_id,
                })
                .await;
            }
            QueueEvent::Completed(result) => {
                let now = now_ms();
                if result.segment_id.starts_with("history_") || result.segment_id.starts_with("paragraph_") {
                    let sentence_id = result
                        .segment_id
                        .strip_prefix("history_")
                        .unwrap_or(&result.segment_id)
                        .to_string();
                    let outcome = self.history.lock().unwrap().update_translation(&sentence_id, &result.target_text);
                    if outcome == UpdateOutcome::AppliedToEmittedBlock {
                        let block = self.history.lock().unwrap().block_for_sentence(&sentence_id).cloned();
                        if let Some(block) = block {
                            self.publish(OutboundEvent::HistoryBlockUpdated {
                                block_id: block.id,
                                sentence_id,
                                translation: result.target_text.clone(),
                                height: block.height,
                            })
                            .await;
                        }
                    }

                    let summary = self
                        .summarization
                        .lock()
                        .await
                        .add_final_text(&result.source_text, &source_lang, &target_lang, now)
                        .await;
                    if let Some(record) = summary {
                        self.publish_summary(record).await;
                    }
                } else {
                    self.display.lock().unwrap().complete_translation(now);
                }

                self.publish(OutboundEvent::Translation {
                    original_text: result.source_text,
                    translated_text: result.target_text,
                    source_language: source_lang,
                    target_language: target_lang,
                    confidence: result.confidence,
                    is_final: true,
                    segment_id: result.segment_id,
                })
                .await;
            }
            QueueEvent::Error { segment_id, error } => {
                self.publish(OutboundEvent::Error {
                    code: error.code().to_string(),
                    message: error.to_string(),
                    recoverable: error.recoverable(),
                    details: Some(segment_id),
                })
                .await;
            }
        }
    }

    async fn publish_summary(&self, record: SummaryRecord) {
        let kind = match record.kind {
            crate::summarization::SummaryKind::Progressive => "progressive",
            crate::summarization::SummaryKind::Periodic => "periodic",
            crate::summarization::SummaryKind::Final => "final",
        };
        self.publish(OutboundEvent::Summary {
            summary_kind: kind.to_string(),
            threshold: record.threshold,
            source_text: record.source_text,
            target_text: record.target_text,
            word_count: record.word_count,
            start_ts: record.start_ts,
            end_ts: record.end_ts,
        })
        .await;
    }
}

/// Owns a listening session end to end: ASR connection, translation
/// dispatch, assembly, display, history, and summarization.
pub struct PipelineOrchestrator<M: TranslationModel + Clone + Send + Sync + 'static> {
    shared: Arc<Shared<M>>,
    root_cancel: CancellationToken,
    session_cancel: Mutex<Option<CancellationToken>>,
}

impl<M: TranslationModel + Clone + Send + Sync + 'static> PipelineOrchestrator<M> {
    pub fn new(config: PipelineConfig, model: M) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let root_cancel = CancellationToken::new();
        let (queue, queue_events) = TranslationQueue::new(config.queue.clone(), root_cancel.child());

        let realtime = Arc::new(RealtimeTranslator::new(model.clone()));
        let history_translator = Arc::new(HistoryTranslator::new(model.clone()));
        queue.register_handler(HandlerTier::Realtime, realtime);
        queue.register_handler(HandlerTier::History, history_translator);

        let shared = Arc::new(Shared {
            combiner: Mutex::new(SentenceCombiner::new(config.sentence_combiner.clone())),
            paragraphs: Mutex::new(ParagraphBuilder::new(config.paragraph_builder.clone())),
            display: Mutex::new(RealtimeDisplayModel::new(config.display.clone())),
            history: Mutex::new(HistoryGrouper::new(config.history_grouper.clone())),
            summarization: tokio::sync::Mutex::new(SummarizationEngine::new(config.summarization.clone(), model.clone())),
            asr: tokio::sync::Mutex::new(AsrStreamAdapter::new(config.asr.clone())),
            state: Mutex::new(PipelineStateMachine::new()),
            queue,
            model,
            outbound_tx,
            langs: Mutex::new(("en".to_string(), "en".to_string())),
            session_started_at: Mutex::new(None),
            last_segment_at: Mutex::new(None),
            config,
        });

        spawn_queue_event_loop(shared.clone(), queue_events, root_cancel.child());

        (Self { shared, root_cancel, session_cancel: Mutex::new(None) }, outbound_rx)
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state.lock().unwrap().state()
    }

    /// `start-listening {source_lang, target_lang, correlation_id}`.
    pub async fn start_listening(
        &self,
        transport: Box<dyn AsrTransport>,
        options: AsrConnectOptions,
        source_lang: String,
        target_lang: String,
        correlation_id: String,
    ) -> Result<(), PipelineError> {
        {
            let mut sm = self.shared.state.lock().unwrap();
            sm.set_correlation_id(correlation_id);
        }
        self.shared.transition(PipelineState::Starting, None).await?;

        *self.shared.langs.lock().unwrap() = (source_lang, target_lang);
        *self.shared.session_started_at.lock().unwrap() = Some(now_ms());

        let events = {
            let mut adapter = self.shared.asr.lock().await;
            match adapter.connect(transport, options).await {
                Ok(events) => events,
                Err(e) => {
                    self.shared.transition(PipelineState::Error, Some(e.to_string())).await.ok();
                    self.shared.transition(PipelineState::Idle, None).await.ok();
                    return Err(PipelineError::Asr(e));
                }
            }
        };

        self.shared.transition(PipelineState::Listening, None).await?;

        let session_cancel = self.root_cancel.child();
        spawn_asr_event_loop(self.shared.clone(), events, session_cancel.child());
        spawn_periodic_summary_ticker(self.shared.clone(), session_cancel.child());
        spawn_inactivity_ticker(self.shared.clone(), session_cancel.child());
        *self.session_cancel.lock().unwrap() = Some(session_cancel);

        Ok(())
    }

    /// Accept one PCM frame. Dropped silently unless the pipeline is
    /// currently `listening` (§4.11, §5).
    pub async fn send_audio(&self, frame: Vec<u8>) {
        if self.state() != PipelineState::Listening {
            return;
        }
        self.shared.asr.lock().await.send_audio(frame);
    }

    /// `pause` — stops forwarding PCM frames without interrupting
    /// in-flight translations (§5).
    pub async fn pause(&self, reason: Option<String>) -> Result<(), PipelineError> {
        let ok = self.shared.state.lock().unwrap().pause(reason);
        if !ok {
            return Err(PipelineError::InvalidState { message: "pause is only valid while listening".into() });
        }
        self.shared
            .publish(OutboundEvent::Status {
                state: "paused".into(),
                previous_state: "listening".into(),
                uptime_ms: self.shared.uptime_ms(),
            })
            .await;
        Ok(())
    }

    /// `resume` — restores the pre-pause state.
    pub async fn resume(&self, reason: Option<String>) -> Result<(), PipelineError> {
        let restored = {
            let mut sm = self.shared.state.lock().unwrap();
            if !sm.resume(reason) {
                return Err(PipelineError::InvalidState { message: "resume is only valid while paused".into() });
            }
            sm.state()
        };
        self.shared
            .publish(OutboundEvent::Status {
                state: state_label(restored).to_string(),
                previous_state: "paused".into(),
                uptime_ms: self.shared.uptime_ms(),
            })
            .await;
        Ok(())
    }

    /// `stop-listening {correlation_id}` — drains the queue within a
    /// grace window equal to the per-job timeout, disconnects the ASR
    /// session, flushes pending assembly buffers, and emits a final
    /// summary of anything untriggered (§5, §4.11).
    pub async fn stop_listening(&self) -> Result<(), PipelineError> {
        self.shared.transition(PipelineState::Stopping, None).await?;

        if let Some(cancel) = self.session_cancel.lock().unwrap().take() {
            cancel.cancel();
        }

        let (source_lang, target_lang) = self.shared.langs();
        let now = now_ms();

        if let Some(sentence) = self.shared.combiner.lock().unwrap().force_emit() {
            self.shared.on_combined_sentence(sentence, &source_lang, &target_lang).await;
        }
        if let Some(paragraph) = self.shared.paragraphs.lock().unwrap().flush() {
            self.shared.on_paragraph(paragraph, &source_lang, &target_lang).await;
        }

        self.shared.queue.drain(Duration::from_millis(self.shared.config.queue.request_timeout_ms)).await;

        if let Some(record) = self.shared.summarization.lock().await.final_summary(&source_lang, &target_lang, now).await
        {
            self.shared.publish_summary(record).await;
        }

        self.shared.asr.lock().await.disconnect().await;

        self.shared.transition(PipelineState::Idle, None).await?;
        Ok(())
    }

    /// `clear-history` — discards all history blocks, emitted summaries,
    /// and the summarization word buffer accumulated so far (§8).
    pub async fn clear_history(&self) {
        *self.shared.history.lock().unwrap() = HistoryGrouper::new(self.shared.config.history_grouper.clone());
        self.shared.summarization.lock().await.reset();
    }

    /// `generate-vocabulary`.
    pub async fn generate_vocabulary(&self) -> Vec<VocabularyItem> {
        let (source_lang, _) = self.shared.langs();
        let items = self.shared.summarization.lock().await.extract_vocabulary(&source_lang).await;
        self.shared
            .publish(OutboundEvent::Vocabulary { items: items.clone(), total_terms: items.len() })
            .await;
        items
    }

    /// `generate-final-report`.
    pub async fn generate_final_report(&self) -> Result<String, PipelineError> {
        let (source_lang, target_lang) = self.shared.langs();
        let engine = self.shared.summarization.lock().await;
        let report = engine.final_report(&source_lang, &target_lang).await?;
        let total_word_count = engine.word_count();
        let summary_count = engine.emitted_summaries().len();
        drop(engine);
        let vocabulary_count = self.shared.summarization.lock().await.extract_vocabulary(&source_lang).await.len();

        self.shared
            .publish(OutboundEvent::FinalReport {
                report_markdown: report.clone(),
                total_word_count,
                summary_count,
                vocabulary_count,
            })
            .await;
        Ok(report)
    }

    /// `translate-user-input {text, from, to}` — bypasses the queue
    /// entirely; user-submitted text carries no segment_id (§6).
    pub async fn translate_user_input(&self, text: &str, from: &str, to: &str) -> Result<String, PipelineError> {
        let translator = HistoryTranslator::new(self.shared.model.clone());
        Ok(translator.translate_text(text, from, to).await?)
    }
}

fn spawn_queue_event_loop<M: TranslationModel + Send + Sync + 'static>(
    shared: Arc<Shared<M>>,
    mut events: mpsc::UnboundedReceiver<QueueEvent>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => {
                    match event {
                        Some(event) => shared.apply_queue_event(event).await,
                        None => break,
                    }
                }
            }
        }
    });
}

fn spawn_asr_event_loop<M: TranslationModel + Send + Sync + 'static>(
    shared: Arc<Shared<M>>,
    mut events: mpsc::UnboundedReceiver<AsrAdapterEvent>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => {
                    match event {
                        Some(event) => handle_asr_event(&shared, event).await,
                        None => break,
                    }
                }
            }
        }
    });
}

async fn handle_asr_event<M: TranslationModel + Send + Sync + 'static>(shared: &Arc<Shared<M>>, event: AsrAdapterEvent) {
    let (source_lang, _) = shared.langs();
    match event {
        AsrAdapterEvent::Connected => info!("ASR session connected"),
        AsrAdapterEvent::Transcript(segment) => {
            let now = now_ms();
            if segment.is_final {
                shared.display.lock().unwrap().on_final(&segment.id, &segment.text, now);
            } else {
                shared.display.lock().unwrap().on_interim(&segment.text, now);
            }
            shared
                .publish(OutboundEvent::Asr {
                    text: segment.text.clone(),
                    confidence: segment.confidence,
                    is_final: segment.is_final,
                    language: source_lang,
                    segment_id: segment.id.clone(),
                })
                .await;
            if segment.is_final {
                shared.handle_final_segment(&segment).await;
            }
        }
        AsrAdapterEvent::UtteranceEnd => debug!("ASR utterance end"),
        AsrAdapterEvent::Metadata(_) => {}
        AsrAdapterEvent::Error(error) => {
            shared
                .publish(OutboundEvent::Error {
                    code: error.code().to_string(),
                    message: error.to_string(),
                    recoverable: error.recoverable(),
                    details: None,
                })
                .await;
            if !error.recoverable() {
                shared.transition(PipelineState::Error, Some(error.to_string())).await.ok();
                shared.transition(PipelineState::Idle, None).await.ok();
            }
        }
        AsrAdapterEvent::Disconnected { reason } => debug!(reason, "ASR session disconnected"),
    }
}

fn spawn_periodic_summary_ticker<M: TranslationModel + Send + Sync + 'static>(
    shared: Arc<Shared<M>>,
    cancel: CancellationToken,
) {
    let interval_ms = shared.config.summarization.summary_interval_ms;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let (source_lang, target_lang) = shared.langs();
                    let record = shared.summarization.lock().await.maybe_periodic(&source_lang, &target_lang, now_ms()).await;
                    if let Some(record) = record {
                        shared.publish_summary(record).await;
                    }
                }
            }
        }
    });
}

fn spawn_inactivity_ticker<M: TranslationModel + Send + Sync + 'static>(shared: Arc<Shared<M>>, cancel: CancellationToken) {
    let timeout_ms = shared.config.sentence_combiner.timeout_ms;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(250));
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let idle_for = shared.last_segment_at.lock().unwrap().map(|t| now_ms().saturating_sub(t));
                    if let Some(idle_for) = idle_for {
                        if idle_for >= timeout_ms {
                            let sentence = shared.combiner.lock().unwrap().force_emit();
                            if let Some(sentence) = sentence {
                                let (source_lang, target_lang) = shared.langs();
                                shared.on_combined_sentence(sentence, &source_lang, &target_lang).await;
                            }
                            *shared.last_segment_at.lock().unwrap() = None;
                        }
                    }
                }
            }
        }
    });
}
