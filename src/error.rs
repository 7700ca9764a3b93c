//! Aggregated pipeline error type (§7).
//!
//! Components never throw across their boundaries; they emit typed
//! errors on their own event outputs. `PipelineError` exists only for
//! the orchestrator to fold those into a single `error` event payload.

use thiserror::Error;

use crate::asr::AsrError;
use crate::llm::ModelError;
use crate::translation::{QueueError, TranslationError};

#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    #[error(transparent)]
    Asr(#[from] AsrError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("model error: {0}")]
    Model(String),

    #[error("invalid operation in current state: {message}")]
    InvalidState { message: String },
}

impl From<ModelError> for PipelineError {
    fn from(e: ModelError) -> Self {
        PipelineError::Model(e.to_string())
    }
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Asr(e) => e.code(),
            PipelineError::Translation(e) => e.code(),
            PipelineError::Queue(e) => match e {
                QueueError::QueueFull { .. } => "QUEUE_FULL",
                QueueError::Duplicate { .. } => "DUPLICATE",
            },
            PipelineError::Model(_) => "TRANSPORT_ERROR",
            PipelineError::InvalidState { .. } => "INVALID_STATE",
        }
    }

    pub fn recoverable(&self) -> bool {
        match self {
            PipelineError::Asr(e) => e.recoverable(),
            PipelineError::Translation(e) => e.recoverable(),
            PipelineError::Queue(_) => true,
            PipelineError::Model(_) => true,
            PipelineError::InvalidState { .. } => true,
        }
    }
}
