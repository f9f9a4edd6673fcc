//! HTTP surface of the bridge
//!
//! Commands and liveness probes arrive under `/drone`; the drone itself
//! connects to the WebSocket endpoint at [`LINK_PATH`].

use crate::config::LINK_PATH;
use crate::correlation::{CommandRequest, Dispatcher};
use crate::error::BridgeError;
use crate::session::run_link_session;
use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const COMMAND_ROUTE: &str = "/drone/go/{demozone}/{corrid}/{folder}/{zone}";
const COMMAND_EMPTY_SOURCE_ROUTE: &str = "/drone/go/{demozone}/{corrid}/{folder}/{zone}/";
const COMMAND_WITH_SOURCE_ROUTE: &str = "/drone/go/{demozone}/{corrid}/{folder}/{zone}/{source}";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// Every response body is `{"message": ...}`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Error response with the status code chosen by the call site
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Map a failure on the command path
    fn command(err: BridgeError) -> Self {
        let status = match &err {
            BridgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::CommandSuperseded(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }

    /// Map a failure on the probe path
    fn probe(err: BridgeError) -> Self {
        let status = match &err {
            BridgeError::LinkUnavailable => {
                return Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "WS session not opened".into(),
                };
            }
            BridgeError::ProbeTimeout => StatusCode::REQUEST_TIMEOUT,
            BridgeError::ProbeAlreadyPending => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, MessageBody::new(self.message)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CommandParams {
    demozone: String,
    corrid: String,
    folder: String,
    zone: String,
    #[serde(default)]
    source: Option<String>,
}

impl From<CommandParams> for CommandRequest {
    fn from(p: CommandParams) -> Self {
        Self {
            demozone: p.demozone,
            corr_id: p.corrid,
            folder: p.folder,
            zone: p.zone,
            source: p.source,
        }
    }
}

/// Build the bridge router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/drone", get(usage))
        .route("/drone/", get(usage))
        .route("/drone/ping", get(ping))
        .route(COMMAND_ROUTE, post(send_command))
        .route(COMMAND_EMPTY_SOURCE_ROUTE, post(send_command))
        .route(COMMAND_WITH_SOURCE_ROUTE, post(send_command))
        .route(LINK_PATH, get(link_upgrade))
        .with_state(state)
}

async fn usage() -> Json<MessageBody> {
    info!("Usage requested");
    MessageBody::new("Usage: POST /drone/go/{demozone}/{corrid}/{folder}/{zone}/{source?}")
}

async fn send_command(
    State(state): State<AppState>,
    Path(params): Path<CommandParams>,
) -> Result<Json<MessageBody>, ApiError> {
    state
        .dispatcher
        .submit_command(params.into())
        .await
        .map_err(ApiError::command)?;

    Ok(MessageBody::new("Command sent successfully"))
}

async fn ping(State(state): State<AppState>) -> Result<Json<MessageBody>, ApiError> {
    info!("PING request received");
    state.dispatcher.probe().await.map_err(ApiError::probe)?;
    Ok(MessageBody::new("OK"))
}

async fn link_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_link_session(socket, state.dispatcher))
}
