//! Persisted lecture history grouped into sentence/paragraph blocks (§4.8).

pub mod grouper;

pub use grouper::{BlockKind, HistoryBlock, HistoryGrouper, HistoryItem, UpdateOutcome};
