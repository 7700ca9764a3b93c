//! Bounded-concurrency, priority-ordered translation dispatch (§4.2).
//!
//! A `Notify`-driven loop owned by a spawned task, state behind a `Mutex`,
//! counters surfaced through a snapshot struct, applied to a priority queue
//! instead of a plain FIFO.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

use crate::cancel::CancellationToken;
use crate::config::QueueConfig;
use crate::metrics::{QueueMetrics, QueueMetricsSnapshot};

use super::handler::{PartialSink, TranslationHandler};
use super::types::{JobKind, Priority, QueueError, TranslationJob, TranslationResult};

/// Which handler tier a [`JobKind`] is routed to (§4.11: realtime vs
/// history/paragraph jobs are served by distinct translator components).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerTier {
    Realtime,
    History,
}

fn tier_for(kind: JobKind) -> HandlerTier {
    match kind {
        JobKind::Realtime => HandlerTier::Realtime,
        JobKind::History | JobKind::Paragraph => HandlerTier::History,
    }
}

/// Emitted by the queue as jobs progress; the orchestrator forwards these
/// into outbound events.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    Partial(TranslationResult),
    Completed(TranslationResult),
    Error { segment_id: String, error: super::types::TranslationError },
}

struct QueueState {
    queued: VecDeque<TranslationJob>,
    pending_ids: HashSet<String>,
    active_count: usize,
}

/// A priority-ordered job queue with bounded concurrency, segment-id
/// dedup, and per-job timeouts.
///
/// Insertion maintains a three-segment invariant `[High*, Normal*, Low*]`:
/// a new job is inserted at the end of its own segment, which both
/// enforces FIFO within a priority class and keeps higher-priority work
/// ahead of lower (§4.2).
pub struct TranslationQueue {
    config: QueueConfig,
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    accepting: Arc<AtomicBool>,
    metrics: Arc<QueueMetrics>,
    handlers: Arc<Mutex<std::collections::HashMap<HandlerTier, Arc<dyn TranslationHandler>>>>,
    events_tx: mpsc::UnboundedSender<QueueEvent>,
    cancel: CancellationToken,
}

impl TranslationQueue {
    pub fn new(config: QueueConfig, cancel: CancellationToken) -> (Self, mpsc::UnboundedReceiver<QueueEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let queue = Self {
            config,
            state: Arc::new(Mutex::new(QueueState {
                queued: VecDeque::new(),
                pending_ids: HashSet::new(),
                active_count: 0,
            })),
            notify: Arc::new(Notify::new()),
            accepting: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(QueueMetrics::default()),
            handlers: Arc::new(Mutex::new(std::collections::HashMap::new())),
            events_tx,
            cancel,
        };
        queue.spawn_dispatcher();
        (queue, events_rx)
    }

    pub fn register_handler(&self, tier: HandlerTier, handler: Arc<dyn TranslationHandler>) {
        self.handlers.lock().unwrap().insert(tier, handler);
    }

    pub fn metrics(&self) -> Arc<QueueMetrics> {
        self.metrics.clone()
    }

    pub fn stats(&self) -> QueueMetricsSnapshot {
        let state = self.state.lock().unwrap();
        QueueMetricsSnapshot {
            active: state.active_count,
            queued: state.queued.len(),
            completed: self.metrics.completed.load(Ordering::Relaxed),
            errors: self.metrics.errors.load(Ordering::Relaxed),
            avg_processing_ms: self.metrics.avg_processing_ms(),
        }
    }

    /// Enqueue a job. Rejects duplicates (by `segment_id`, active or
    /// queued) and rejects when `queued_count >= max_queue` (§4.2).
    pub fn enqueue(&self, job: TranslationJob) -> Result<(), QueueError> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(QueueError::QueueFull { queued: self.config.max_queue, max: self.config.max_queue });
        }
        let mut state = self.state.lock().unwrap();
        if state.pending_ids.contains(&job.segment_id) {
            return Err(QueueError::Duplicate { segment_id: job.segment_id });
        }
        if state.queued.len() >= self.config.max_queue {
            return Err(QueueError::QueueFull { queued: state.queued.len(), max: self.config.max_queue });
        }
        state.pending_ids.insert(job.segment_id.clone());
        insert_by_priority(&mut state.queued, job);
        drop(state);
        self.notify.notify_one();
        Ok(())
    }

    /// Stop accepting new jobs and wait for in-flight and queued work to
    /// drain, up to `grace`. Anything still queued past the deadline is
    /// discarded; in-flight jobs are left to finish or hit their own
    /// per-job timeout (§5: "stop_listening drains the queue, allowing
    /// running jobs to finish within a grace window").
    pub async fn drain(&self, grace: Duration) {
        self.accepting.store(false, Ordering::SeqCst);
        let deadline = Instant::now() + grace;
        loop {
            {
                let state = self.state.lock().unwrap();
                if state.active_count == 0 && state.queued.is_empty() {
                    return;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let mut state = self.state.lock().unwrap();
        let drained: Vec<_> = state.queued.drain(..).collect();
        for job in drained {
            state.pending_ids.remove(&job.segment_id);
        }
    }

    fn spawn_dispatcher(&self) {
        let state = self.state.clone();
        let notify = self.notify.clone();
        let handlers = self.handlers.clone();
        let metrics = self.metrics.clone();
        let events_tx = self.events_tx.clone();
        let cancel = self.cancel.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = notify.notified() => {}
                }

                loop {
                    let job = {
                        let mut st = state.lock().unwrap();
                        if st.active_count < config.max_concurrency {
                            st.queued.pop_front()
                        } else {
                            None
                        }
                    };
                    let Some(job) = job else { break };
                    {
                        state.lock().unwrap().active_count += 1;
                    }
                    dispatch_job(
                        job,
                        state.clone(),
                        handlers.clone(),
                        metrics.clone(),
                        events_tx.clone(),
                        notify.clone(),
                        config.request_timeout_ms,
                    );
                }
            }
        });
    }
}

fn dispatch_job(
    job: TranslationJob,
    state: Arc<Mutex<QueueState>>,
    handlers: Arc<Mutex<std::collections::HashMap<HandlerTier, Arc<dyn TranslationHandler>>>>,
    metrics: Arc<QueueMetrics>,
    events_tx: mpsc::UnboundedSender<QueueEvent>,
    notify: Arc<Notify>,
    timeout_ms: u64,
) {
    tokio::spawn(async move {
        let segment_id = job.segment_id.clone();
        let tier = tier_for(job.kind);
        let handler = handlers.lock().unwrap().get(&tier).cloned();

        let outcome = match handler {
            Some(handler) => {
                let (partial_sink, mut partial_rx) = if job.kind == JobKind::Realtime {
                    let (tx, rx) = mpsc::unbounded_channel();
                    (Some(PartialSink(tx)), Some(rx))
                } else {
                    (None, None)
                };

                let forward_events_tx = events_tx.clone();
                let forwarder = partial_rx.take().map(|mut rx| {
                    tokio::spawn(async move {
                        while let Some(result) = rx.recv().await {
                            let _ = forward_events_tx.send(QueueEvent::Partial(result));
                        }
                    })
                });

                let started = Instant::now();
                let result = tokio::time::timeout(
                    Duration::from_millis(timeout_ms),
                    handler.handle(job.clone(), partial_sink),
                )
                .await;

                if let Some(handle) = forwarder {
                    handle.abort();
                }

                match result {
                    Ok(Ok(result)) => {
                        metrics.record_completion(started.elapsed().as_millis() as u64);
                        Ok(result)
                    }
                    Ok(Err(e)) => {
                        metrics.record_error();
                        Err(e)
                    }
                    Err(_) => {
                        metrics.record_error();
                        Err(super::types::TranslationError::Timeout { timeout_ms })
                    }
                }
            }
            None => {
                metrics.record_error();
                Err(super::types::TranslationError::ModelError {
                    message: "no handler registered for this job kind".into(),
                })
            }
        };

        match outcome {
            Ok(result) => {
                let _ = events_tx.send(QueueEvent::Completed(result));
            }
            Err(error) => {
                let _ = events_tx.send(QueueEvent::Error { segment_id: segment_id.clone(), error });
            }
        }

        {
            let mut st = state.lock().unwrap();
            st.active_count -= 1;
            st.pending_ids.remove(&segment_id);
        }
        notify.notify_one();
    });
}

/// Insert `job` maintaining the `[High*, Normal*, Low*]` segment
/// invariant, appended to the end of its own segment.
fn insert_by_priority(queue: &mut VecDeque<TranslationJob>, job: TranslationJob) {
    let index = match job.priority {
        Priority::High => queue.iter().take_while(|j| j.priority == Priority::High).count(),
        Priority::Normal => queue.iter().take_while(|j| j.priority != Priority::Low).count(),
        Priority::Low => queue.len(),
    };
    queue.insert(index, job);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration as StdDuration;

    fn job(segment_id: &str, priority: Priority, kind: JobKind) -> TranslationJob {
        TranslationJob {
            segment_id: segment_id.into(),
            original_text: "hello".into(),
            source_lang: "en".into(),
            target_lang: "ja".into(),
            enqueued_at: 0,
            priority,
            kind,
        }
    }

    #[test]
    fn priority_insertion_keeps_segments_ordered() {
        let mut q = VecDeque::new();
        insert_by_priority(&mut q, job("a", Priority::Normal, JobKind::History));
        insert_by_priority(&mut q, job("b", Priority::Low, JobKind::Paragraph));
        insert_by_priority(&mut q, job("c", Priority::High, JobKind::Realtime));
        insert_by_priority(&mut q, job("d", Priority::Normal, JobKind::History));
        let ids: Vec<&str> = q.iter().map(|j| j.segment_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "d", "b"]);
    }

    struct EchoHandler;

    #[async_trait]
    impl TranslationHandler for EchoHandler {
        async fn handle(
            &self,
            job: TranslationJob,
            partials: Option<PartialSink>,
        ) -> Result<TranslationResult, super::super::types::TranslationError> {
            if let Some(sink) = &partials {
                sink.send(TranslationResult {
                    segment_id: job.segment_id.clone(),
                    source_text: job.original_text.clone(),
                    target_text: "...".into(),
                    confidence: 0.5,
                    first_paint_ms: Some(1),
                    complete_ms: None,
                    is_final: false,
                });
            }
            Ok(TranslationResult {
                segment_id: job.segment_id,
                source_text: job.original_text.clone(),
                target_text: format!("translated:{}", job.original_text),
                confidence: 0.9,
                first_paint_ms: Some(1),
                complete_ms: Some(5),
                is_final: true,
            })
        }
    }

    #[tokio::test]
    async fn dispatches_and_completes_a_job() {
        let (queue, mut events) = TranslationQueue::new(QueueConfig::default(), CancellationToken::new());
        queue.register_handler(HandlerTier::Realtime, Arc::new(EchoHandler));
        queue.enqueue(job("seg-1", Priority::Normal, JobKind::Realtime)).unwrap();

        let mut saw_completed = false;
        for _ in 0..5 {
            if let Ok(Some(event)) = tokio::time::timeout(StdDuration::from_millis(200), events.recv()).await {
                if let QueueEvent::Completed(result) = event {
                    assert_eq!(result.target_text, "translated:hello");
                    saw_completed = true;
                    break;
                }
            }
        }
        assert!(saw_completed);
    }

    #[tokio::test]
    async fn duplicate_segment_id_is_rejected() {
        let (queue, _events) = TranslationQueue::new(QueueConfig::default(), CancellationToken::new());
        queue.enqueue(job("seg-1", Priority::Normal, JobKind::History)).unwrap();
        let err = queue.enqueue(job("seg-1", Priority::High, JobKind::History)).unwrap_err();
        assert_eq!(err, QueueError::Duplicate { segment_id: "seg-1".into() });
    }

    #[tokio::test]
    async fn full_queue_is_rejected() {
        let config = QueueConfig { max_queue: 1, max_concurrency: 0, request_timeout_ms: 1_000 };
        let (queue, _events) = TranslationQueue::new(config, CancellationToken::new());
        queue.enqueue(job("seg-1", Priority::Normal, JobKind::History)).unwrap();
        let err = queue.enqueue(job("seg-2", Priority::Normal, JobKind::History)).unwrap_err();
        assert!(matches!(err, QueueError::QueueFull { .. }));
    }
}
