//! Pending-call registry: the open correlation and the liveness probe
//!
//! The two slots are independent. A command never touches the probe and a
//! probe never touches the open correlation.

use super::probe::{ProbeOutcome, ProbeSlot};
use crate::error::BridgeError;
use drone_bridge_shared::{CorrelationMatch, CorrelationStateMachine};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct PendingCallRegistry {
    correlation: CorrelationStateMachine,
    probe: ProbeSlot,
}

impl PendingCallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a correlation, returning the id it superseded
    pub fn open(&mut self, corr_id: &str, demozone: &str) -> Option<String> {
        self.correlation.open(corr_id, demozone)
    }

    pub fn match_report(&self, id: &str) -> CorrelationMatch {
        self.correlation.match_report(id)
    }

    pub fn close(&mut self) -> bool {
        self.correlation.close()
    }

    pub fn open_id(&self) -> Option<&str> {
        self.correlation.open_id()
    }

    pub async fn open_probe(
        &self,
        timeout: Duration,
    ) -> Result<oneshot::Receiver<ProbeOutcome>, BridgeError> {
        self.probe.open(timeout).await
    }

    pub async fn resolve_probe_reply(&self) -> bool {
        self.probe.resolve_reply().await
    }

    pub async fn cancel_probe(&self) -> bool {
        self.probe.cancel().await
    }

    pub async fn probe_pending(&self) -> bool {
        self.probe.is_pending().await
    }
}
