//! Command data lookups against the APEX REST service

use super::traits::CommandDataSource;
use crate::config::BridgeConfig;
use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

const DOCS_SETUP_PATH: &str = "/apex/pdb1/anki/docs/setup";
const ZONE_STEPS_PATH: &str = "/apex/pdb1/anki/zone/steps";

/// APEX collection envelope: `{"items": [...]}`
#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ZoneRow {
    /// JSON-encoded array of flight steps
    commands: String,
}

/// Reads docs setup and zone steps from the database REST host
pub struct ApexCommandData {
    client: reqwest::Client,
    base_url: String,
}

impl ApexCommandData {
    pub fn new(config: &BridgeConfig) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: config.db_host.trim_end_matches('/').to_string(),
        })
    }

    async fn get_first<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, CollaboratorError> {
        debug!(url, "Database lookup");
        let body: Items<T> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body.items.into_iter().next())
    }
}

#[async_trait]
impl CommandDataSource for ApexCommandData {
    async fn docs_setup(&self, demozone: &str) -> Result<Map<String, Value>, CollaboratorError> {
        let url = format!("{}{}/{}", self.base_url, DOCS_SETUP_PATH, demozone);
        self.get_first(&url)
            .await?
            .ok_or(CollaboratorError::NoDocsSetup)
    }

    async fn zone_steps(&self, demozone: &str, zone: &str) -> Result<Vec<Value>, CollaboratorError> {
        let url = format!("{}{}/{}/{}", self.base_url, ZONE_STEPS_PATH, demozone, zone);
        let row: ZoneRow = self
            .get_first(&url)
            .await?
            .ok_or(CollaboratorError::ZoneNotFound)?;

        parse_steps(&row.commands)
    }
}

fn parse_steps(commands: &str) -> Result<Vec<Value>, CollaboratorError> {
    Ok(serde_json::from_str(commands)?)
}
