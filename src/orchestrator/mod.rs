//! Wires every component together into one session (§4.11).

pub mod orchestrator;

pub use orchestrator::PipelineOrchestrator;
