//! Drone Bridge Shared Protocol Types
//!
//! This crate provides the control-link message types, the JSON frame codec,
//! status translation and the correlation state machine shared by the bridge
//! and anything that speaks to it over the link.

pub mod codec;
pub mod messages;
pub mod state_machine;
pub mod status;

// Re-export commonly used types at crate root
pub use codec::{CodecError, LinkMessage};
pub use messages::*;
pub use state_machine::{CorrelationMatch, CorrelationState, CorrelationStateMachine};
pub use status::{DroneStatus, LinkCode, StatusAction};

/// Source tag used when a command does not name its originating system
pub const DEFAULT_SOURCE: &str = "PCS";

/// Timing parameters for the control link
pub mod timing {
    /// How long a liveness probe waits for the drone to answer
    pub const PROBE_TIMEOUT_MS: u64 = 5000;

    /// Connect/request timeout for the telemetry event server
    pub const EVENT_TIMEOUT_MS: u64 = 1000;
}

