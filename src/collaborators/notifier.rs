//! Downstream notifications over HTTP

use super::traits::NotificationSink;
use crate::config::BridgeConfig;
use crate::error::CollaboratorError;
use async_trait::async_trait;
use drone_bridge_shared::{CompletionEvent, StatusEvent};

const DRONE_LAND_PATH: &str = "/soa-infra/resources/default/DroneHelper/DispatchDroneService/drone/land";
const DRONE_EVENT_PATH: &str = "/event/drone";

/// Posts completion callbacks to SOA and status changes to the event server
pub struct HttpNotifier {
    soa_client: reqwest::Client,
    event_client: reqwest::Client,
    completion_url: String,
    status_url: String,
}

impl HttpNotifier {
    pub fn new(config: &BridgeConfig) -> Result<Self, CollaboratorError> {
        let soa_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        let event_client = reqwest::Client::builder()
            .connect_timeout(config.event_timeout)
            .timeout(config.event_timeout)
            .build()?;

        Ok(Self {
            soa_client,
            event_client,
            completion_url: format!("{}{}", config.soa_host.trim_end_matches('/'), DRONE_LAND_PATH),
            status_url: format!("{}{}", config.event_host.trim_end_matches('/'), DRONE_EVENT_PATH),
        })
    }
}

#[async_trait]
impl NotificationSink for HttpNotifier {
    async fn send_completion(&self, event: &CompletionEvent) -> Result<(), CollaboratorError> {
        self.soa_client
            .post(&self.completion_url)
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn send_status(&self, event: &StatusEvent) -> Result<(), CollaboratorError> {
        // The event server expects a batch, even for a single update
        self.event_client
            .post(&self.status_url)
            .json(&[event])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
