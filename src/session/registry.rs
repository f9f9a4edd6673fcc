//! Registry for the single active control link

use super::connection::LinkHandle;
use crate::error::BridgeError;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Holds the one connected drone link, if any
#[derive(Debug, Default)]
pub struct LinkRegistry {
    current: Option<LinkHandle>,
    next_id: u64,
}

impl LinkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection, superseding any previous one.
    /// Returns the id assigned to the new link.
    pub fn on_connect(&mut self, writer: mpsc::UnboundedSender<String>) -> u64 {
        self.next_id += 1;
        let handle = LinkHandle::new(self.next_id, writer);

        if let Some(previous) = self.current.replace(handle) {
            warn!(
                superseded = previous.link_id,
                link_id = self.next_id,
                "New drone connection supersedes the previous one"
            );
        }

        self.next_id
    }

    /// Clear the link if `link_id` is still the current one.
    /// A disconnect from an already superseded link is ignored.
    pub fn on_disconnect(&mut self, link_id: u64) -> bool {
        match &self.current {
            Some(handle) if handle.link_id == link_id => {
                self.current = None;
                true
            }
            _ => {
                info!(link_id, "Disconnect from a superseded link, keeping current");
                false
            }
        }
    }

    /// Send a frame over the current link
    pub fn send(&self, frame: String) -> Result<(), BridgeError> {
        let handle = self.current.as_ref().ok_or(BridgeError::LinkUnavailable)?;
        handle.send(frame)
    }

    /// Whether a drone is connected
    pub fn is_connected(&self) -> bool {
        self.current.as_ref().is_some_and(LinkHandle::is_open)
    }

    /// Id of the current link
    pub fn current_id(&self) -> Option<u64> {
        self.current.as_ref().map(|h| h.link_id)
    }
}
