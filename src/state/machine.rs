//! Session lifecycle state machine (§4.10).

use std::collections::VecDeque;

const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Starting,
    Listening,
    Processing,
    Stopping,
    Error,
    Paused,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub reason: Option<String>,
}

fn allowed(from: PipelineState, to: PipelineState) -> bool {
    use PipelineState::*;
    matches!(
        (from, to),
        (Idle, Starting)
            | (Starting, Listening)
            | (Starting, Error)
            | (Starting, Idle)
            | (Listening, Processing)
            | (Listening, Stopping)
            | (Listening, Error)
            | (Listening, Paused)
            | (Processing, Listening)
            | (Processing, Stopping)
            | (Processing, Error)
            | (Stopping, Idle)
            | (Stopping, Error)
            | (Error, Idle)
            | (Paused, Listening)
            | (Paused, Stopping)
            | (Paused, Idle)
    )
}

/// Tracks the current pipeline state, a bounded transition history, and
/// the state `pause()` should restore on `resume()`.
pub struct PipelineStateMachine {
    current: PipelineState,
    history: VecDeque<Transition>,
    pre_pause_state: Option<PipelineState>,
    correlation_id: Option<String>,
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStateMachine {
    pub fn new() -> Self {
        Self { current: PipelineState::Idle, history: VecDeque::new(), pre_pause_state: None, correlation_id: None }
    }

    pub fn state(&self) -> PipelineState {
        self.current
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn set_correlation_id(&mut self, id: impl Into<String>) {
        self.correlation_id = Some(id.into());
    }

    pub fn history(&self) -> impl Iterator<Item = &Transition> {
        self.history.iter()
    }

    /// Attempt a transition. Returns `false` for a transition the state
    /// machine does not allow, leaving state unchanged (§4.10).
    pub fn transition(&mut self, to: PipelineState, reason: Option<String>) -> bool {
        if !allowed(self.current, to) {
            return false;
        }
        self.record(to, reason);
        if to == PipelineState::Idle {
            self.correlation_id = None;
        }
        true
    }

    /// Valid only from `Listening`; stashes the current state so
    /// `resume()` can restore it.
    pub fn pause(&mut self, reason: Option<String>) -> bool {
        if self.current != PipelineState::Listening {
            return false;
        }
        self.pre_pause_state = Some(self.current);
        self.record(PipelineState::Paused, reason);
        true
    }

    /// Restores the pre-pause state, defaulting to `Listening` if none
    /// was recorded.
    pub fn resume(&mut self, reason: Option<String>) -> bool {
        if self.current != PipelineState::Paused {
            return false;
        }
        let restore_to = self.pre_pause_state.take().unwrap_or(PipelineState::Listening);
        self.record(restore_to, reason);
        true
    }

    fn record(&mut self, to: PipelineState, reason: Option<String>) {
        self.history.push_back(Transition { from: self.current, to, reason });
        if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.current = to;
    }
}
