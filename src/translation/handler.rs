//! The handler seam both translation tiers implement (§4.2–§4.4, §9).
//!
//! "Base-class inheritance across components → components are plain
//! owned structs composed by the orchestrator; ... shared capability
//! sets are expressed as small interfaces/traits at component
//! boundaries (e.g., TranslationHandler)."

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{TranslationError, TranslationJob, TranslationResult};

/// A sink for realtime partial deltas. History-tier handlers never
/// receive one (§4.4: "single-shot (non-partial-emitting)").
#[derive(Clone)]
pub struct PartialSink(pub(crate) mpsc::UnboundedSender<TranslationResult>);

impl PartialSink {
    pub fn send(&self, result: TranslationResult) {
        let _ = self.0.send(result);
    }
}

/// Registered with the [`crate::translation::queue::TranslationQueue`]
/// and invoked once per dispatched job.
#[async_trait]
pub trait TranslationHandler: Send + Sync {
    async fn handle(
        &self,
        job: TranslationJob,
        partials: Option<PartialSink>,
    ) -> Result<TranslationResult, TranslationError>;
}
