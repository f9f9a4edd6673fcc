//! Bridge configuration, read from the environment

use drone_bridge_shared::timing;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Path the drone connects to for the control link
pub const LINK_PATH: &str = "/ws";

/// Configuration for the bridge service
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Interface to bind the HTTP listener on
    pub bind_host: String,
    /// HTTP and WebSocket port
    pub port: u16,
    /// Database REST host (docs setup and zone steps)
    pub db_host: String,
    /// SOA host receiving completion callbacks
    pub soa_host: String,
    /// Event server receiving status updates
    pub event_host: String,
    /// Liveness probe deadline
    pub probe_timeout: Duration,
    /// Connect/request timeout for the event server
    pub event_timeout: Duration,
    /// Skip TLS verification for the database and SOA hosts
    pub accept_invalid_certs: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: 9999,
            db_host: "https://129.152.129.94".into(),
            soa_host: "http://129.152.131.150:8001".into(),
            event_host: "http://129.152.131.103:10001".into(),
            probe_timeout: Duration::from_millis(timing::PROBE_TIMEOUT_MS),
            event_timeout: Duration::from_millis(timing::EVENT_TIMEOUT_MS),
            accept_invalid_certs: true,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            bind_host: lookup("DRONE_BIND_HOST").unwrap_or(defaults.bind_host),
            port: parse_or("DRONEPORT", lookup("DRONEPORT"), defaults.port),
            db_host: lookup("DRONE_DB_HOST").unwrap_or(defaults.db_host),
            soa_host: lookup("DRONE_SOA_HOST").unwrap_or(defaults.soa_host),
            event_host: lookup("DRONE_EVENT_HOST").unwrap_or(defaults.event_host),
            probe_timeout: Duration::from_millis(parse_or(
                "DRONE_PROBE_TIMEOUT_MS",
                lookup("DRONE_PROBE_TIMEOUT_MS"),
                timing::PROBE_TIMEOUT_MS,
            )),
            event_timeout: Duration::from_millis(parse_or(
                "DRONE_EVENT_TIMEOUT_MS",
                lookup("DRONE_EVENT_TIMEOUT_MS"),
                timing::EVENT_TIMEOUT_MS,
            )),
            accept_invalid_certs: parse_or(
                "DRONE_ACCEPT_INVALID_CERTS",
                lookup("DRONE_ACCEPT_INVALID_CERTS"),
                defaults.accept_invalid_certs,
            ),
        }
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %value, "Ignoring unparseable config value");
                default
            }
        },
        None => default,
    }
}
