//! Deadline tracking for the liveness probe

use crate::error::BridgeError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// How a pending probe was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The drone answered before the deadline
    Reply,
    /// The deadline elapsed first
    Timeout,
}

struct PendingProbe {
    token: u64,
    waiter: oneshot::Sender<ProbeOutcome>,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct ProbeState {
    pending: Option<PendingProbe>,
    next_token: u64,
}

/// Single slot for an outstanding liveness probe.
///
/// Whichever of the reply or the deadline timer reaches the slot first
/// takes the waiter; the other finds the slot empty.
#[derive(Clone, Default)]
pub struct ProbeSlot {
    state: Arc<Mutex<ProbeState>>,
}

impl ProbeSlot {
    /// Create an empty probe slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a probe with the given deadline
    pub async fn open(
        &self,
        timeout: Duration,
    ) -> Result<oneshot::Receiver<ProbeOutcome>, BridgeError> {
        let mut state = self.state.lock().await;
        if state.pending.is_some() {
            return Err(BridgeError::ProbeAlreadyPending);
        }

        state.next_token += 1;
        let token = state.next_token;
        let (waiter, rx) = oneshot::channel();

        let slot = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            slot.expire(token).await;
        });

        state.pending = Some(PendingProbe {
            token,
            waiter,
            timer,
        });

        Ok(rx)
    }

    /// Resolve the pending probe with a reply. Returns false if none was pending.
    pub async fn resolve_reply(&self) -> bool {
        let Some(probe) = self.state.lock().await.pending.take() else {
            return false;
        };

        probe.timer.abort();
        if probe.waiter.send(ProbeOutcome::Reply).is_err() {
            debug!("Probe caller went away before the reply arrived");
        }
        true
    }

    /// Drop the pending probe without resolving it
    pub async fn cancel(&self) -> bool {
        match self.state.lock().await.pending.take() {
            Some(probe) => {
                probe.timer.abort();
                true
            }
            None => false,
        }
    }

    pub async fn is_pending(&self) -> bool {
        self.state.lock().await.pending.is_some()
    }

    async fn expire(&self, token: u64) {
        let mut state = self.state.lock().await;
        let is_current = state.pending.as_ref().is_some_and(|p| p.token == token);
        if !is_current {
            return;
        }

        if let Some(probe) = state.pending.take() {
            info!("Probe timed out without a reply");
            // Ignored if the caller already dropped its receiver
            let _ = probe.waiter.send(ProbeOutcome::Timeout);
        }
    }
}
