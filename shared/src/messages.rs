//! Control-link and downstream message types
//!
//! Field names follow the wire format the drone app and the downstream
//! services already speak, hence the mixed casing in the serde renames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::DroneStatus;

/// Command pushed to the drone over the control link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneCommand {
    pub source: String,
    #[serde(rename = "corrId")]
    pub corr_id: String,
    pub demozone: String,
    /// Document-store setup for the demozone, with `folderId` added
    #[serde(rename = "DOCS")]
    pub docs: Map<String, Value>,
    /// Flight steps for the requested zone, passed through opaque
    pub steps: Vec<Value>,
}

impl DroneCommand {
    /// Compose a command from the two collaborator lookups
    pub fn new(
        source: impl Into<String>,
        corr_id: impl Into<String>,
        demozone: impl Into<String>,
        mut docs: Map<String, Value>,
        folder_id: impl Into<String>,
        steps: Vec<Value>,
    ) -> Self {
        docs.insert("folderId".into(), Value::String(folder_id.into()));
        Self {
            source: source.into(),
            corr_id: corr_id.into(),
            demozone: demozone.into(),
            docs,
            steps,
        }
    }
}

/// A single step of a liveness probe request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeStep {
    pub command: String,
}

/// Liveness request: `{"steps":[{"command":"ping"}]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub steps: Vec<ProbeStep>,
}

impl Default for ProbeRequest {
    fn default() -> Self {
        Self {
            steps: vec![ProbeStep {
                command: "ping".into(),
            }],
        }
    }
}

/// Raw inbound frame as sent by the drone, before validation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub demozone: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

/// Completion notification for the system that originated the command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    #[serde(rename = "SOURCE")]
    pub source: String,
    #[serde(rename = "PROCESSID")]
    pub process_id: String,
    #[serde(rename = "DEMOZONE")]
    pub demozone: String,
    pub result: String,
}

impl CompletionEvent {
    /// Create a successful completion for a correlation
    pub fn ok(
        source: impl Into<String>,
        process_id: impl Into<String>,
        demozone: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            process_id: process_id.into(),
            demozone: demozone.into(),
            result: "OK".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub data_demozone: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub data: StatusData,
}

/// Status change for the telemetry event server.
///
/// Shaped like an IoT device message so the event server can treat drone
/// updates the same way as its other feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub payload: StatusPayload,
}

impl StatusEvent {
    pub fn new(demozone: impl Into<String>, status: DroneStatus) -> Self {
        Self {
            payload: StatusPayload {
                data: StatusData {
                    data_demozone: demozone.into(),
                    status: status.as_str().into(),
                },
            },
        }
    }

    /// Canonical status name carried by this event
    pub fn status(&self) -> &str {
        &self.payload.data.status
    }
}
