//! Status translation for raw control-link result codes

use std::fmt;

/// Result codes the drone reports over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCode {
    /// Liveness reply
    Ping,
    Go,
    Picture,
    Return,
    Landing,
    Downloading,
    /// Mission finished and drone landed
    Finish,
}

impl LinkCode {
    /// Parse a raw code, ignoring case. Unknown codes yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = match raw.to_ascii_lowercase().as_str() {
            "ping" => LinkCode::Ping,
            "go" => LinkCode::Go,
            "picture" => LinkCode::Picture,
            "return" => LinkCode::Return,
            "landing" => LinkCode::Landing,
            "downloading" => LinkCode::Downloading,
            "finish" => LinkCode::Finish,
            _ => return None,
        };
        Some(code)
    }
}

/// Canonical drone status reported downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneStatus {
    Going,
    TakingPicture,
    Returning,
    Landing,
    Downloading,
    Landed,
}

impl DroneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DroneStatus::Going => "GOING",
            DroneStatus::TakingPicture => "TAKING PICTURE",
            DroneStatus::Returning => "RETURNING",
            DroneStatus::Landing => "LANDING",
            DroneStatus::Downloading => "DOWNLOADING",
            DroneStatus::Landed => "LANDED",
        }
    }

    /// Whether this status closes the open correlation
    pub fn is_terminal(&self) -> bool {
        matches!(self, DroneStatus::Landed)
    }
}

impl fmt::Display for DroneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the bridge does in response to a raw code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// Resolve the pending liveness probe
    ResolveProbe,
    /// Emit a status event
    EmitStatus(DroneStatus),
    /// Emit a completion event followed by a status event
    EmitCompletion(DroneStatus),
    /// Unrecognized code, reserved for future use
    Ignore,
}

impl StatusAction {
    /// The status to publish, if any
    pub fn status(&self) -> Option<DroneStatus> {
        match self {
            StatusAction::EmitStatus(s) | StatusAction::EmitCompletion(s) => Some(*s),
            StatusAction::ResolveProbe | StatusAction::Ignore => None,
        }
    }
}

/// Map a raw link code to the action the bridge should take
pub fn translate(raw: &str) -> StatusAction {
    match LinkCode::parse(raw) {
        Some(LinkCode::Ping) => StatusAction::ResolveProbe,
        Some(LinkCode::Go) => StatusAction::EmitStatus(DroneStatus::Going),
        Some(LinkCode::Picture) => StatusAction::EmitStatus(DroneStatus::TakingPicture),
        Some(LinkCode::Return) => StatusAction::EmitStatus(DroneStatus::Returning),
        Some(LinkCode::Landing) => StatusAction::EmitStatus(DroneStatus::Landing),
        Some(LinkCode::Downloading) => StatusAction::EmitStatus(DroneStatus::Downloading),
        Some(LinkCode::Finish) => StatusAction::EmitCompletion(DroneStatus::Landed),
        None => StatusAction::Ignore,
    }
}
