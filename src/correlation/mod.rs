//! Correlation of HTTP commands with drone reports
//!
//! This module handles:
//! - Opening a correlation per command and pushing it to the drone
//! - Matching inbound link reports against the open correlation
//! - Liveness probes with a reply-or-deadline race
//! - Remembering which system originated each command

mod dispatcher;
mod pending;
mod probe;
mod source_tags;

pub use dispatcher::{CommandRequest, Dispatcher, LinkOutcome};
pub use pending::PendingCallRegistry;
pub use probe::{ProbeOutcome, ProbeSlot};
pub use source_tags::{SourceTagRecord, SourceTagStore};
