//! Translation domain types (§3, §4.2–§4.4).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduling priority for a translation job (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Normal,
    Low,
}

/// Which tier (and therefore which handler) a job is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    Realtime,
    History,
    Paragraph,
}

/// A unit of translation work submitted to the [`crate::translation::queue::TranslationQueue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    pub segment_id: String,
    pub original_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub enqueued_at: u64,
    pub priority: Priority,
    pub kind: JobKind,
}

/// The outcome of translating a job, possibly a partial delta.
///
/// Partial deltas carry the same `segment_id` with `is_final = false` and
/// monotonically growing `target_text` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub segment_id: String,
    pub source_text: String,
    pub target_text: String,
    pub confidence: f32,
    pub first_paint_ms: Option<u64>,
    pub complete_ms: Option<u64>,
    pub is_final: bool,
}

/// Errors a [`crate::translation::handler::TranslationHandler`] can raise (§7).
#[derive(Debug, Error, Clone)]
pub enum TranslationError {
    #[error("translation model call failed: {message}")]
    ModelError { message: String },

    #[error("translation job timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("translation job was cancelled")]
    Cancelled,

    #[error("malformed model output: {message}")]
    ParseError { message: String },
}

impl TranslationError {
    pub fn code(&self) -> &'static str {
        match self {
            TranslationError::ModelError { .. } => "TRANSPORT_ERROR",
            TranslationError::Timeout { .. } => "TIMEOUT",
            TranslationError::Cancelled => "TIMEOUT",
            TranslationError::ParseError { .. } => "PARSE_ERROR",
        }
    }

    pub fn recoverable(&self) -> bool {
        true
    }
}

/// Errors the queue itself can raise synchronously to the caller (§4.2, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("translation queue is full ({queued}/{max})")]
    QueueFull { queued: usize, max: usize },

    #[error("a job for segment_id {segment_id} is already active or queued")]
    Duplicate { segment_id: String },
}
