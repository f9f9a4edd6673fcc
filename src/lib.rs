//! Drone Bridge
//!
//! Bridges synchronous HTTP commands to the asynchronous control link of a
//! single connected drone. A command opens a correlation, the drone reports
//! progress over the link, and matching reports are forwarded to the
//! downstream status and completion services.

pub mod api;
pub mod collaborators;
pub mod config;
pub mod correlation;
pub mod error;
pub mod session;

pub use api::{router, AppState};
pub use config::BridgeConfig;
pub use correlation::{CommandRequest, Dispatcher, LinkOutcome};
pub use error::{BridgeError, CollaboratorError};
