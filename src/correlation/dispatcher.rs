//! Dispatcher bridging HTTP commands to the drone control link

use super::pending::PendingCallRegistry;
use super::probe::ProbeOutcome;
use super::source_tags::SourceTagStore;
use crate::collaborators::{CommandDataSource, NotificationSink};
use crate::error::BridgeError;
use crate::session::LinkRegistry;
use drone_bridge_shared::{
    codec, status, CodecError, CompletionEvent, CorrelationMatch, DroneCommand, DroneStatus,
    LinkMessage, ProbeRequest, StatusEvent, DEFAULT_SOURCE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// A command request as received over HTTP
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRequest {
    pub demozone: String,
    pub corr_id: String,
    pub folder: String,
    pub zone: String,
    /// Originating system; defaults to `PCS`
    pub source: Option<String>,
}

impl CommandRequest {
    fn validate(&self) -> Result<(), BridgeError> {
        let required = [
            ("demozone", &self.demozone),
            ("corrId", &self.corr_id),
            ("folder", &self.folder),
            ("zone", &self.zone),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(BridgeError::BadRequest(name));
            }
        }
        Ok(())
    }

    fn source(&self) -> &str {
        match self.source.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_SOURCE,
        }
    }
}

/// What happened to an inbound link message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Liveness reply resolved the pending probe
    ProbeResolved,
    /// Liveness reply with no probe waiting
    ProbeIgnored,
    /// Could not be parsed or failed validation
    Malformed,
    /// No correlation is open
    NoCorrelation,
    /// Report for a different correlation than the open one
    Mismatch,
    /// Matched, but the code is not one we act on
    Unrecognized,
    /// Status published; `closed` when the correlation ended
    Reported { status: DroneStatus, closed: bool },
}

/// Shared single-session state, always accessed under one lock
#[derive(Default)]
struct BridgeSession {
    link: LinkRegistry,
    pending: PendingCallRegistry,
    source_tags: SourceTagStore,
}

/// Correlates HTTP commands with drone reports arriving on the link
pub struct Dispatcher {
    session: Mutex<BridgeSession>,
    data_source: Arc<dyn CommandDataSource>,
    notifier: Arc<dyn NotificationSink>,
    probe_timeout: Duration,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(
        data_source: Arc<dyn CommandDataSource>,
        notifier: Arc<dyn NotificationSink>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            session: Mutex::new(BridgeSession::default()),
            data_source,
            notifier,
            probe_timeout,
        }
    }

    /// Register a newly connected drone link
    pub async fn link_connected(&self, writer: mpsc::UnboundedSender<String>) -> u64 {
        self.session.lock().await.link.on_connect(writer)
    }

    /// Forget a drone link. Open correlations and probes are left alone.
    pub async fn link_disconnected(&self, link_id: u64) -> bool {
        self.session.lock().await.link.on_disconnect(link_id)
    }

    pub async fn is_link_connected(&self) -> bool {
        self.session.lock().await.link.is_connected()
    }

    /// Id of the open correlation, if any
    pub async fn open_correlation(&self) -> Option<String> {
        self.session.lock().await.pending.open_id().map(str::to_string)
    }

    pub async fn probe_pending(&self) -> bool {
        self.session.lock().await.pending.probe_pending().await
    }

    /// Number of source tags not yet consumed by a completion
    pub async fn source_tag_count(&self) -> usize {
        self.session.lock().await.source_tags.len()
    }

    /// Open a correlation for the command and push it to the drone.
    ///
    /// Returns once the command is queued on the link; the outcome arrives
    /// later through [`Dispatcher::handle_link_text`]. A failed lookup leaves
    /// the correlation open. A command replaced by a newer one while its
    /// lookups were in flight is never sent.
    pub async fn submit_command(&self, request: CommandRequest) -> Result<(), BridgeError> {
        request.validate()?;
        let source = request.source().to_string();

        {
            let mut session = self.session.lock().await;
            session.source_tags.record(&request.corr_id, &source);
            if let Some(previous) = session.pending.open(&request.corr_id, &request.demozone) {
                warn!(
                    superseded = %previous,
                    corr_id = %request.corr_id,
                    "New command supersedes the open correlation"
                );
            }
        }

        info!(
            corr_id = %request.corr_id,
            demozone = %request.demozone,
            zone = %request.zone,
            source = %source,
            "Command received"
        );

        let (docs, steps) = tokio::try_join!(
            self.data_source.docs_setup(&request.demozone),
            self.data_source.zone_steps(&request.demozone, &request.zone),
        )
        .inspect_err(|e| warn!(corr_id = %request.corr_id, "Command data lookup failed: {}", e))?;

        let command = DroneCommand::new(
            source,
            request.corr_id.as_str(),
            request.demozone.as_str(),
            docs,
            request.folder.as_str(),
            steps,
        );
        let frame = codec::encode(&command)?;

        let session = self.session.lock().await;
        if session.pending.open_id() != Some(request.corr_id.as_str()) {
            warn!(
                corr_id = %request.corr_id,
                "Correlation superseded during lookup, command not sent"
            );
            return Err(BridgeError::CommandSuperseded(request.corr_id));
        }
        if let Err(e) = session.link.send(frame) {
            warn!(corr_id = %request.corr_id, "Request received but no WS session opened");
            return Err(e);
        }

        info!(corr_id = %request.corr_id, "Command sent to drone");
        Ok(())
    }

    /// Ask the drone for a liveness reply and wait for it or the deadline
    pub async fn probe(&self) -> Result<(), BridgeError> {
        let waiter = {
            let session = self.session.lock().await;
            if !session.link.is_connected() {
                info!("Probe requested with no WS session opened");
                return Err(BridgeError::LinkUnavailable);
            }

            let waiter = session.pending.open_probe(self.probe_timeout).await?;
            let frame = codec::encode(&ProbeRequest::default())?;

            if let Err(e) = session.link.send(frame) {
                session.pending.cancel_probe().await;
                return Err(e);
            }
            waiter
        };

        debug!("Probe sent, waiting for reply");
        match waiter.await {
            Ok(ProbeOutcome::Reply) => Ok(()),
            Ok(ProbeOutcome::Timeout) | Err(_) => Err(BridgeError::ProbeTimeout),
        }
    }

    /// Handle one inbound text frame from the drone
    pub async fn handle_link_text(&self, text: &str) -> LinkOutcome {
        debug!(frame = text, "Incoming data received");
        self.handle_link_message(codec::decode_inbound(text)).await
    }

    /// Handle one inbound binary frame from the drone
    pub async fn handle_link_bytes(&self, data: &[u8]) -> LinkOutcome {
        self.handle_link_message(codec::decode_inbound_bytes(data)).await
    }

    async fn handle_link_message(&self, decoded: Result<LinkMessage, CodecError>) -> LinkOutcome {
        let (id, code) = match decoded {
            Ok(LinkMessage::Pong) => {
                let session = self.session.lock().await;
                return if session.pending.resolve_probe_reply().await {
                    info!("Probe reply received");
                    LinkOutcome::ProbeResolved
                } else {
                    debug!("Ignoring liveness reply, no probe pending");
                    LinkOutcome::ProbeIgnored
                };
            }
            Ok(LinkMessage::Report { id, code, .. }) => (id, code),
            Err(e) => {
                warn!("Invalid message received: {}", e);
                return LinkOutcome::Malformed;
            }
        };

        let mut session = self.session.lock().await;

        let demozone = match session.pending.match_report(&id) {
            CorrelationMatch::Matched { demozone } => demozone,
            CorrelationMatch::NoCorrelation => {
                info!(id = %id, "No correlation id stored now, ignoring report");
                return LinkOutcome::NoCorrelation;
            }
            CorrelationMatch::Mismatch { expected } => {
                warn!(
                    expected = %expected,
                    id = %id,
                    "Current correlation id doesn't match incoming id"
                );
                return LinkOutcome::Mismatch;
            }
        };

        let action = status::translate(&code);
        let Some(drone_status) = action.status() else {
            debug!(id = %id, code = %code, "Unrecognized result code");
            return LinkOutcome::Unrecognized;
        };

        let completion = if drone_status.is_terminal() {
            let source = session.source_tags.consume(&id);
            session.pending.close();
            Some(CompletionEvent::ok(source, id.as_str(), demozone.as_str()))
        } else {
            None
        };
        drop(session);

        info!(id = %id, status = %drone_status, "Drone status changed");
        let closed = completion.is_some();
        self.publish(completion, StatusEvent::new(demozone, drone_status));

        LinkOutcome::Reported {
            status: drone_status,
            closed,
        }
    }

    /// Fire downstream notifications without waiting on them
    fn publish(&self, completion: Option<CompletionEvent>, status: StatusEvent) {
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            if let Some(event) = completion {
                debug!(?event, "Completion callback to be invoked");
                match notifier.send_completion(&event).await {
                    Ok(()) => info!(process_id = %event.process_id, "Completion callback invoked"),
                    Err(e) => warn!(process_id = %event.process_id, "Completion callback failed: {}", e),
                }
            }

            match notifier.send_status(&status).await {
                Ok(()) => debug!(status = status.status(), "Status sent to event server"),
                Err(e) => warn!(status = status.status(), "Failed to send status to event server: {}", e),
            }
        });
    }
}
