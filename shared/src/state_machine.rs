//! Correlation State Machine
//!
//! Tracks the single in-flight command. Opening a new correlation while one
//! is outstanding supersedes it; only a matching terminal report closes it.

/// Current correlation state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorrelationState {
    /// No command in flight
    #[default]
    Idle,
    /// A command was sent and its outcome is still pending
    AwaitingResult { corr_id: String, demozone: String },
}

/// Result of matching an inbound report against the open correlation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationMatch {
    /// Nothing is open, the report is stale
    NoCorrelation,
    /// A different correlation is open
    Mismatch { expected: String },
    /// The report belongs to the open correlation
    Matched { demozone: String },
}

/// Single-slot correlation tracker
#[derive(Debug, Default)]
pub struct CorrelationStateMachine {
    state: CorrelationState,
}

impl CorrelationStateMachine {
    /// Create a new state machine in Idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> &CorrelationState {
        &self.state
    }

    /// The open correlation id, if any
    pub fn open_id(&self) -> Option<&str> {
        match &self.state {
            CorrelationState::AwaitingResult { corr_id, .. } => Some(corr_id),
            CorrelationState::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == CorrelationState::Idle
    }

    /// Open a correlation, returning the id it superseded
    pub fn open(&mut self, corr_id: impl Into<String>, demozone: impl Into<String>) -> Option<String> {
        let previous = std::mem::replace(
            &mut self.state,
            CorrelationState::AwaitingResult {
                corr_id: corr_id.into(),
                demozone: demozone.into(),
            },
        );

        match previous {
            CorrelationState::AwaitingResult { corr_id, .. } => Some(corr_id),
            CorrelationState::Idle => None,
        }
    }

    /// Check an inbound report id against the open correlation
    pub fn match_report(&self, id: &str) -> CorrelationMatch {
        match &self.state {
            CorrelationState::Idle => CorrelationMatch::NoCorrelation,
            CorrelationState::AwaitingResult { corr_id, .. } if corr_id != id => {
                CorrelationMatch::Mismatch {
                    expected: corr_id.clone(),
                }
            }
            CorrelationState::AwaitingResult { demozone, .. } => CorrelationMatch::Matched {
                demozone: demozone.clone(),
            },
        }
    }

    /// Return to Idle. Returns false if nothing was open.
    pub fn close(&mut self) -> bool {
        let was_open = !self.is_idle();
        self.state = CorrelationState::Idle;
        was_open
    }
}
