//! ASR-related type definitions.
//!
//! Common types used throughout the streaming speech recognition
//! adapter (§3, §4.1).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One ASR output, final or interim, carrying a text span (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub id: String,
    pub text: String,
    /// Always in `[0, 1]`; missing provider confidence is treated as 0.
    pub confidence: f32,
    pub is_final: bool,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub received_at: u64,
}

/// Connection parameters for a streaming ASR session (§4.1, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConnectOptions {
    pub model: String,
    pub language: String,
    pub sample_rate: u32,
    pub channels: u8,
    pub interim_results: bool,
    pub endpointing_ms: u64,
    pub utterance_end_ms: u64,
    pub smart_format: bool,
    pub encoding: &'static str,
    pub bearer_token: String,
}

/// Raw events surfaced by the underlying provider transport, before the
/// adapter layers reconnection/keep-alive/segment-id bookkeeping on top.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    Interim {
        text: String,
        confidence: Option<f32>,
        start_ms: Option<u64>,
        end_ms: Option<u64>,
    },
    Final {
        text: String,
        confidence: Option<f32>,
        start_ms: Option<u64>,
        end_ms: Option<u64>,
    },
    UtteranceEnd,
    Metadata(serde_json::Value),
    Error {
        message: String,
        retryable: bool,
    },
    Closed {
        code: Option<u16>,
        reason: String,
    },
}

/// Events the adapter exposes to the orchestrator, one per §4.1 bullet.
#[derive(Debug, Clone)]
pub enum AsrAdapterEvent {
    Connected,
    Transcript(TranscriptSegment),
    UtteranceEnd,
    Metadata(serde_json::Value),
    Error(AsrError),
    Disconnected { reason: String },
}

/// ASR processing errors (§7).
#[derive(Debug, Error, Clone)]
pub enum AsrError {
    #[error("ASR connection rejected: {message}")]
    AuthError { message: String },

    #[error("ASR transport error: {message}")]
    TransportError { message: String },

    #[error("ASR reconnect attempts exhausted after {attempts} tries")]
    ReconnectExhausted { attempts: u32 },

    #[error("ASR provider closed the connection: {reason}")]
    ProviderClosed { reason: String },

    #[error("operation invalid in current adapter state: {message}")]
    InvalidState { message: String },

    #[error("malformed provider frame: {message}")]
    ParseError { message: String },
}

impl AsrError {
    /// Whether this error kind is recoverable at the session scope (§7).
    pub fn recoverable(&self) -> bool {
        !matches!(self, AsrError::AuthError { .. } | AsrError::ReconnectExhausted { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            AsrError::AuthError { .. } => "AUTH_ERROR",
            AsrError::TransportError { .. } => "TRANSPORT_ERROR",
            AsrError::ReconnectExhausted { .. } => "TRANSPORT_ERROR",
            AsrError::ProviderClosed { .. } => "TRANSPORT_ERROR",
            AsrError::InvalidState { .. } => "INVALID_STATE",
            AsrError::ParseError { .. } => "PARSE_ERROR",
        }
    }
}
