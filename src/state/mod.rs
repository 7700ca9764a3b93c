//! Session lifecycle state machine (§4.10).

pub mod machine;

pub use machine::{PipelineState, PipelineStateMachine, Transition};
