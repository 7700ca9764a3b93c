//! Two-tier translation: realtime partial streaming and single-shot
//! history/paragraph translation, dispatched through a shared priority
//! queue (§4.2–§4.4).

pub mod cleaning;
pub mod handler;
pub mod history;
pub mod prompts;
pub mod queue;
pub mod realtime;
pub mod types;

pub use handler::{PartialSink, TranslationHandler};
pub use history::HistoryTranslator;
pub use queue::{HandlerTier, QueueEvent, TranslationQueue};
pub use realtime::RealtimeTranslator;
pub use types::{JobKind, Priority, QueueError, TranslationError, TranslationJob, TranslationResult};
