//! Streaming LLM client used by both translation tiers and the
//! summarization engine (§6).
//!
//! [`TranslationModel`] is the seam: production code streams from a real
//! provider over SSE-shaped chunked HTTP, tests drive
//! [`mock::MockModel`]. Grounded in the bytes_stream/StreamExt consumption
//! pattern used across the retrieval pack's streaming TTS/LLM clients.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Reasoning-effort hint sent with each upstream call (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Minimal,
    Low,
    High,
}

impl ReasoningEffort {
    fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Minimal => "minimal",
            ReasoningEffort::Low => "low",
            ReasoningEffort::High => "high",
        }
    }
}

/// One streaming request to the translation/summary upstream.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub user_content: String,
    pub max_output_tokens: u32,
    pub reasoning_effort: ReasoningEffort,
}

#[derive(Debug, Error, Clone)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model stream ended with malformed chunk: {0}")]
    Malformed(String),
}

pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// A streaming text-generation model, abstracting over the concrete
/// upstream provider.
#[async_trait]
pub trait TranslationModel: Send + Sync {
    async fn stream(&self, request: ModelRequest) -> Result<DeltaStream, ModelError>;
}

/// Lets a session share one model instance across the realtime and
/// history handlers (and the orchestrator's ad-hoc translations) without
/// requiring the concrete model type to be `Clone` itself.
#[async_trait]
impl<T: TranslationModel + ?Sized> TranslationModel for std::sync::Arc<T> {
    async fn stream(&self, request: ModelRequest) -> Result<DeltaStream, ModelError> {
        (**self).stream(request).await
    }
}

/// A real upstream client speaking a line-delimited `data: {"delta": "..."}`
/// streaming protocol over HTTP, in the style of the SSE-consuming
/// `bytes_stream()` clients elsewhere in the retrieval pack.
pub struct HttpTranslationModel {
    client: reqwest::Client,
    endpoint: String,
    bearer_token: String,
}

impl HttpTranslationModel {
    pub fn new(endpoint: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            bearer_token: bearer_token.into(),
        }
    }
}

#[async_trait]
impl TranslationModel for HttpTranslationModel {
    async fn stream(&self, request: ModelRequest) -> Result<DeltaStream, ModelError> {
        let body = serde_json::json!({
            "system": request.system_prompt,
            "input": request.user_content,
            "max_output_tokens": request.max_output_tokens,
            "reasoning_effort": request.reasoning_effort.as_str(),
            "stream": true,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Request(format!("upstream returned {status}: {text}")));
        }

        let byte_stream = response.bytes_stream();
        let delta_stream = parse_sse_deltas(byte_stream);
        Ok(Box::pin(delta_stream))
    }
}

/// Parse a chunked `data: {json}\n\n` stream into a stream of `delta`
/// field values, the shape described in §6 ("Streaming deltas are
/// consumed by field `delta` on chunks tagged as incremental text
/// deltas").
fn parse_sse_deltas(
    mut byte_stream: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin + Send + 'static,
) -> impl Stream<Item = Result<String, ModelError>> + Send {
    async_stream::stream! {
        let mut buffer = String::new();
        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(ModelError::Request(e.to_string()));
                    return;
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find("\n\n") {
                let event = buffer[..pos].to_string();
                buffer.drain(..pos + 2);
                for line in event.lines() {
                    let Some(data) = line.strip_prefix("data:") else { continue };
                    let data = data.trim();
                    if data == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<serde_json::Value>(data) {
                        Ok(value) => {
                            if let Some(delta) = value.get("delta").and_then(|d| d.as_str()) {
                                if !delta.is_empty() {
                                    yield Ok(delta.to_string());
                                }
                            }
                        }
                        Err(e) => yield Err(ModelError::Malformed(e.to_string())),
                    }
                }
            }
        }
    }
}

/// Hand-scripted model for tests: replays a fixed list of deltas with a
/// configurable per-delta delay, or fails outright.
pub mod mock {
    use super::*;
    use tokio::sync::Mutex;

    pub struct MockModel {
        pub deltas: Vec<String>,
        pub delay: Duration,
        pub fail: bool,
        calls: Mutex<Vec<ModelRequest>>,
    }

    impl MockModel {
        pub fn new(deltas: Vec<&str>) -> Self {
            Self {
                deltas: deltas.into_iter().map(String::from).collect(),
                delay: Duration::from_millis(0),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                deltas: Vec::new(),
                delay: Duration::from_millis(0),
                fail: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub async fn call_count(&self) -> usize {
            self.calls.lock().await.len()
        }
    }

    #[async_trait]
    impl TranslationModel for MockModel {
        async fn stream(&self, request: ModelRequest) -> Result<DeltaStream, ModelError> {
            self.calls.lock().await.push(request);
            if self.fail {
                return Err(ModelError::Request("mock model failure".into()));
            }
            let deltas = self.deltas.clone();
            let delay = self.delay;
            let stream = async_stream::stream! {
                for delta in deltas {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    yield Ok(delta);
                }
            };
            Ok(Box::pin(stream))
        }
    }
}
