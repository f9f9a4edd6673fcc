//! Trait seams for the collaborator services

use crate::error::CollaboratorError;
use async_trait::async_trait;
use drone_bridge_shared::{CompletionEvent, StatusEvent};
use serde_json::{Map, Value};

/// Source of the data a drone command is composed from
#[async_trait]
pub trait CommandDataSource: Send + Sync {
    /// Document-store setup for a demozone
    async fn docs_setup(&self, demozone: &str) -> Result<Map<String, Value>, CollaboratorError>;

    /// Flight steps for a zone within a demozone
    async fn zone_steps(&self, demozone: &str, zone: &str) -> Result<Vec<Value>, CollaboratorError>;
}

/// Downstream receivers of drone progress
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Tell the originating system the drone has landed
    async fn send_completion(&self, event: &CompletionEvent) -> Result<(), CollaboratorError>;

    /// Publish a status change to the telemetry event server
    async fn send_status(&self, event: &StatusEvent) -> Result<(), CollaboratorError>;
}
