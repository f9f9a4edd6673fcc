//! Error types for the bridge

use drone_bridge_shared::CodecError;
use thiserror::Error;

/// Failures from the collaborator HTTP services
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("NO DOCS SETUP INFO FOUND IN THE DATABASE")]
    NoDocsSetup,

    #[error("Requested ZONE not found in database.")]
    ZoneNotFound,

    #[error("Invalid zone steps: {0}")]
    InvalidSteps(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the dispatcher to its callers
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Missing required field: {0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    CollaboratorLookupFailed(#[from] CollaboratorError),

    #[error("WebSocket session not opened!")]
    LinkUnavailable,

    #[error("Command {0} superseded by a newer command")]
    CommandSuperseded(String),

    #[error("PING already in progress")]
    ProbeAlreadyPending,

    #[error("TIMEOUT")]
    ProbeTimeout,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}
