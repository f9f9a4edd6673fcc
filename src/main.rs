use drone_bridge::collaborators::{ApexCommandData, HttpNotifier};
use drone_bridge::config::LINK_PATH;
use drone_bridge::{router, AppState, BridgeConfig, Dispatcher};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = BridgeConfig::from_env();

    info!("Drone bridge starting");
    info!("  Database: {}", config.db_host);
    info!("  SOA: {}", config.soa_host);
    info!("  Event server: {}", config.event_host);

    let data_source = Arc::new(ApexCommandData::new(&config)?);
    let notifier = Arc::new(HttpNotifier::new(&config)?);
    let dispatcher = Arc::new(Dispatcher::new(data_source, notifier, config.probe_timeout));

    let app = router(AppState::new(dispatcher)).layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("REST server running on http://{}/drone", addr);
    info!("WS server running on ws://{}{}", addr, LINK_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Drone bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Caught interrupt signal, exiting gracefully"),
        _ = terminate => info!("Received SIGTERM, exiting gracefully"),
    }
}
