//! The streaming ASR session adapter (§4.1).
//!
//! Owns the provider connection lifecycle: connect, keep-alive, frame
//! back-pressure, reconnection with backoff, and translation of raw
//! [`ProviderEvent`]s into [`AsrAdapterEvent`]s with stable segment ids.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::transport::AsrTransport;
use super::types::{AsrAdapterEvent, AsrConnectOptions, AsrError, ProviderEvent, TranscriptSegment};
use crate::cancel::CancellationToken;
use crate::config::AsrConfig;
use crate::metrics::{AsrMetrics, AsrMetricsSnapshot};

/// Adapter-level connection state, independent from the session-wide
/// [`crate::state::machine::PipelineState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Idle,
    Listening,
    Reconnecting,
    Disconnected,
    Error,
}

/// A bounded ring buffer of undelivered PCM frames. When saturated the
/// oldest frame is dropped and counted, never blocking the producer
/// (§4.1, §5).
struct AudioFrameRing {
    inner: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
    capacity: usize,
    metrics: Arc<AsrMetrics>,
}

impl AudioFrameRing {
    fn new(capacity: usize, metrics: Arc<AsrMetrics>) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
            metrics,
        }
    }

    fn push(&self, frame: Vec<u8>) {
        let mut guard = self.inner.lock().unwrap();
        if guard.len() >= self.capacity {
            guard.pop_front();
            self.metrics.dropped_frames.fetch_add(1, Ordering::Relaxed);
        }
        guard.push_back(frame);
        drop(guard);
        self.notify.notify_one();
    }

    async fn pop(&self) -> Vec<u8> {
        loop {
            {
                let mut guard = self.inner.lock().unwrap();
                if let Some(frame) = guard.pop_front() {
                    return frame;
                }
            }
            self.notify.notified().await;
        }
    }
}

/// Owns a streaming ASR connection and emits [`AsrAdapterEvent`]s.
pub struct AsrStreamAdapter {
    config: AsrConfig,
    state: Arc<Mutex<AdapterState>>,
    metrics: Arc<AsrMetrics>,
    ring: Option<Arc<AudioFrameRing>>,
    cancel: CancellationToken,
}

impl AsrStreamAdapter {
    pub fn new(config: AsrConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(AdapterState::Idle)),
            metrics: Arc::new(AsrMetrics::default()),
            ring: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> AdapterState {
        *self.state.lock().unwrap()
    }

    pub fn metrics(&self) -> AsrMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Establish the provider session and spawn the background task that
    /// drives it. Returns a receiver of adapter events.
    pub async fn connect(
        &mut self,
        mut transport: Box<dyn AsrTransport>,
        options: AsrConnectOptions,
    ) -> Result<mpsc::UnboundedReceiver<AsrAdapterEvent>, AsrError> {
        transport.connect(&options).await.map_err(|e| {
            error!(error = %e, "ASR connect failed");
            e
        })?;

        *self.state.lock().unwrap() = AdapterState::Listening;
        info!("ASR adapter connected");

        let ring = Arc::new(AudioFrameRing::new(self.config.audio_ring_capacity, self.metrics.clone()));
        self.ring = Some(ring.clone());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = events_tx.send(AsrAdapterEvent::Connected);

        let task = AdapterTask {
            config: self.config.clone(),
            options,
            transport,
            ring,
            state: self.state.clone(),
            metrics: self.metrics.clone(),
            cancel: self.cancel.clone(),
            events_tx,
            final_counter: AtomicU64::new(0),
            interim_counter: AtomicU64::new(0),
        };
        tokio::spawn(task.run());

        Ok(events_rx)
    }

    /// Accept a PCM frame. Silently dropped when not listening (§4.1).
    pub fn send_audio(&self, frame: Vec<u8>) {
        if *self.state.lock().unwrap() != AdapterState::Listening {
            return;
        }
        if let Some(ring) = &self.ring {
            ring.push(frame);
        }
    }

    /// Graceful close; the background task emits `Disconnected`.
    pub async fn disconnect(&mut self) {
        self.cancel.cancel();
        *self.state.lock().unwrap() = AdapterState::Disconnected;
    }
}

struct AdapterTask {
    config: AsrConfig,
    options: AsrConnectOptions,
    transport: Box<dyn AsrTransport>,
    ring: Arc<AudioFrameRing>,
    state: Arc<Mutex<AdapterState>>,
    metrics: Arc<AsrMetrics>,
    cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<AsrAdapterEvent>,
    final_counter: AtomicU64,
    interim_counter: AtomicU64,
}

impl AdapterTask {
    async fn run(mut self) {
        let mut last_send = Instant::now();
        let mut keepalive_tick = tokio::time::interval(Duration::from_millis(500));
        let mut current_interim_id: Option<String> = None;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                frame = self.ring.pop() => {
                    if let Err(e) = self.transport.send_frame(&frame).await {
                        warn!(error = %e, "frame send failed, entering reconnect");
                        if !self.reconnect(&mut current_interim_id).await {
                            break;
                        }
                        continue;
                    }
                    last_send = Instant::now();
                    self.metrics.frames_sent.fetch_add(1, Ordering::Relaxed);
                }

                event = self.transport.recv_event() => {
                    match event {
                        Some(ev) => self.handle_provider_event(ev, &mut current_interim_id),
                        None => {
                            warn!("ASR transport closed unexpectedly, entering reconnect");
                            if !self.reconnect(&mut current_interim_id).await {
                                break;
                            }
                        }
                    }
                }

                _ = keepalive_tick.tick() => {
                    if last_send.elapsed() >= Duration::from_millis(self.config.keepalive_ms) {
                        debug!("sending ASR keep-alive");
                        if self.transport.send_keepalive().await.is_err() {
                            if !self.reconnect(&mut current_interim_id).await {
                                break;
                            }
                        }
                        last_send = Instant::now();
                    }
                }
            }
        }

        let _ = self.transport.close().await;
        let reason = if *self.state.lock().unwrap() == AdapterState::Error {
            "reconnect attempts exhausted".to_string()
        } else {
            "disconnect requested".to_string()
        };
        let _ = self.events_tx.send(AsrAdapterEvent::Disconnected { reason });
    }

    fn handle_provider_event(&self, event: ProviderEvent, current_interim_id: &mut Option<String>) {
        match event {
            ProviderEvent::Interim { text, confidence, start_ms, end_ms } => {
                if text.trim().is_empty() {
                    return;
                }
                let id = current_interim_id.get_or_insert_with(|| {
                    format!("int_{}", self.interim_counter.fetch_add(1, Ordering::Relaxed))
                });
                let segment = TranscriptSegment {
                    id: id.clone(),
                    text,
                    confidence: confidence.unwrap_or(0.0),
                    is_final: false,
                    start_ms,
                    end_ms,
                    received_at: now_ms(),
                };
                let _ = self.events_tx.send(AsrAdapterEvent::Transcript(segment));
            }
            ProviderEvent::Final { text, confidence, start_ms, end_ms } => {
                if text.trim().is_empty() {
                    *current_interim_id = None;
                    return;
                }
                let id = format!("seg_{}", self.final_counter.fetch_add(1, Ordering::Relaxed));
                *current_interim_id = None;
                let segment = TranscriptSegment {
                    id,
                    text,
                    confidence: confidence.unwrap_or(0.0),
                    is_final: true,
                    start_ms,
                    end_ms,
                    received_at: now_ms(),
                };
                let _ = self.events_tx.send(AsrAdapterEvent::Transcript(segment));
            }
            ProviderEvent::UtteranceEnd => {
                *current_interim_id = None;
                let _ = self.events_tx.send(AsrAdapterEvent::UtteranceEnd);
            }
            ProviderEvent::Metadata(value) => {
                let _ = self.events_tx.send(AsrAdapterEvent::Metadata(value));
            }
            ProviderEvent::Error { message, retryable } => {
                let err = if retryable {
                    AsrError::TransportError { message }
                } else {
                    AsrError::AuthError { message }
                };
                let _ = self.events_tx.send(AsrAdapterEvent::Error(err));
            }
            ProviderEvent::Closed { code, reason } => {
                debug!(?code, %reason, "provider sent close frame");
            }
        }
    }

    /// Exponential backoff reconnect loop (§4.1). Returns `false` once
    /// attempts are exhausted or connect fails with a non-retryable
    /// auth error, in which case the caller should stop the task.
    async fn reconnect(&mut self, current_interim_id: &mut Option<String>) -> bool {
        *current_interim_id = None; // pending interim state is discarded
        *self.state.lock().unwrap() = AdapterState::Reconnecting;

        let mut attempt = 0u32;
        while attempt < self.config.max_reconnect_attempts {
            attempt += 1;
            self.metrics.reconnect_attempts.fetch_add(1, Ordering::Relaxed);

            let base = self.config.backoff_base_ms as f64 * self.config.backoff_factor.powi(attempt as i32 - 1);
            let capped = base.min(self.config.backoff_max_ms as f64);
            let jitter_span = capped * self.config.backoff_jitter;
            let jitter = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
            let delay_ms = (capped + jitter).max(0.0) as u64;

            info!(attempt, delay_ms, "reconnecting to ASR provider");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                _ = self.cancel.cancelled() => return false,
            }

            match self.transport.connect(&self.options).await {
                Ok(()) => {
                    info!(attempt, "ASR reconnect succeeded");
                    *self.state.lock().unwrap() = AdapterState::Listening;
                    return true;
                }
                Err(e) if !e.recoverable() => {
                    error!(error = %e, "ASR reconnect failed with non-recoverable error");
                    *self.state.lock().unwrap() = AdapterState::Error;
                    let _ = self.events_tx.send(AsrAdapterEvent::Error(e));
                    return false;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "ASR reconnect attempt failed");
                }
            }
        }

        error!(attempts = attempt, "ASR reconnect attempts exhausted");
        *self.state.lock().unwrap() = AdapterState::Error;
        let _ = self.events_tx.send(AsrAdapterEvent::Error(AsrError::ReconnectExhausted { attempts: attempt }));
        false
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::transport::mock::MockTransport;
    use std::time::Duration as StdDuration;

    fn options() -> AsrConnectOptions {
        AsrConnectOptions {
            model: "test-model".into(),
            language: "en".into(),
            sample_rate: 16_000,
            channels: 1,
            interim_results: true,
            endpointing_ms: 800,
            utterance_end_ms: 1000,
            smart_format: true,
            encoding: "linear16",
            bearer_token: "token".into(),
        }
    }

    #[tokio::test]
    async fn connect_emits_connected_then_transcripts() {
        let mut adapter = AsrStreamAdapter::new(AsrConfig::default());
        let transport = MockTransport::new();
        let events_tx = transport.events_tx.clone();
        let mut events = adapter.connect(Box::new(transport), options()).await.unwrap();

        assert!(matches!(events.recv().await.unwrap(), AsrAdapterEvent::Connected));

        events_tx
            .send(ProviderEvent::Interim { text: "Hello".into(), confidence: Some(0.8), start_ms: None, end_ms: None })
            .unwrap();
        match events.recv().await.unwrap() {
            AsrAdapterEvent::Transcript(seg) => {
                assert!(!seg.is_final);
                assert_eq!(seg.text, "Hello");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        events_tx
            .send(ProviderEvent::Final { text: "Hello world.".into(), confidence: Some(0.95), start_ms: Some(0), end_ms: Some(500) })
            .unwrap();
        match events.recv().await.unwrap() {
            AsrAdapterEvent::Transcript(seg) => {
                assert!(seg.is_final);
                assert_eq!(seg.text, "Hello world.");
                assert!(seg.id.starts_with("seg_"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_confidence_defaults_to_zero() {
        let mut adapter = AsrStreamAdapter::new(AsrConfig::default());
        let transport = MockTransport::new();
        let events_tx = transport.events_tx.clone();
        let mut events = adapter.connect(Box::new(transport), options()).await.unwrap();
        events.recv().await.unwrap(); // Connected

        events_tx
            .send(ProviderEvent::Final { text: "no confidence".into(), confidence: None, start_ms: None, end_ms: None })
            .unwrap();
        match events.recv().await.unwrap() {
            AsrAdapterEvent::Transcript(seg) => assert_eq!(seg.confidence, 0.0),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_transcripts_are_ignored() {
        let mut adapter = AsrStreamAdapter::new(AsrConfig::default());
        let transport = MockTransport::new();
        let events_tx = transport.events_tx.clone();
        let mut events = adapter.connect(Box::new(transport), options()).await.unwrap();
        events.recv().await.unwrap(); // Connected

        events_tx.send(ProviderEvent::Interim { text: "   ".into(), confidence: None, start_ms: None, end_ms: None }).unwrap();
        events_tx.send(ProviderEvent::Final { text: "real text".into(), confidence: Some(0.5), start_ms: None, end_ms: None }).unwrap();

        match events.recv().await.unwrap() {
            AsrAdapterEvent::Transcript(seg) => assert_eq!(seg.text, "real text"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_audio_is_dropped_when_not_listening() {
        let adapter = AsrStreamAdapter::new(AsrConfig::default());
        assert_eq!(adapter.state(), AdapterState::Idle);
        adapter.send_audio(vec![0u8; 640]);
        // No panic, no ring configured yet; state remains Idle.
        assert_eq!(adapter.state(), AdapterState::Idle);
    }

    #[tokio::test]
    async fn auth_failure_on_connect_is_non_recoverable() {
        let mut adapter = AsrStreamAdapter::new(AsrConfig::default());
        let mut transport = MockTransport::new();
        transport.fail_connect_auth = true;
        let err = adapter.connect(Box::new(transport), options()).await.unwrap_err();
        assert!(!err.recoverable());
    }

    #[tokio::test]
    async fn frame_ring_drops_oldest_when_saturated() {
        let mut config = AsrConfig::default();
        config.audio_ring_capacity = 2;
        let mut adapter = AsrStreamAdapter::new(config);
        let transport = MockTransport::new();
        adapter.connect(Box::new(transport), options()).await.unwrap();

        adapter.send_audio(vec![1]);
        adapter.send_audio(vec![2]);
        adapter.send_audio(vec![3]);

        tokio::time::sleep(StdDuration::from_millis(50)).await;
        let snapshot = adapter.metrics();
        assert!(snapshot.dropped_frames >= 1);
    }
}
