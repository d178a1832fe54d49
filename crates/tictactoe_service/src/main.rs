//! Tic-tac-toe gaming service binary.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tictactoe_service::{
    AppState, Cli, Command, EventPublisher, MqttSink, ServiceConfig, SessionRegistry, build_router,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            no_event_plane,
        } => serve(config.with_overrides(host, port, no_event_plane)).await,
        Command::PrintConfig => {
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    match path {
        Some(path) => Ok(ServiceConfig::from_file(path)?),
        None => Ok(ServiceConfig::default()),
    }
}

/// Run the HTTP API server
#[instrument(skip(config))]
async fn serve(config: ServiceConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting tic-tac-toe gaming service");

    let event_plane = config.event_plane();
    let publisher = EventPublisher::new(*event_plane.channel_capacity());
    if *event_plane.enabled() {
        let (sink, _driver) = MqttSink::connect(event_plane);
        publisher.attach(Arc::new(sink));
        info!(
            broker = %event_plane.broker_address(),
            port = event_plane.broker_port(),
            "Forwarding events to MQTT broker"
        );
    } else {
        warn!("Event plane disabled; events stay in-process");
    }

    let registry = SessionRegistry::new(&config, publisher);
    let sessions = config.sessions();
    match (sessions.cleanup_interval(), sessions.idle_ttl()) {
        (Some(interval), Some(ttl)) => {
            registry.spawn_cleanup(interval, ttl);
            info!(?interval, ?ttl, "Idle session eviction enabled");
        }
        _ => info!("Idle session eviction disabled"),
    }

    let app = build_router(AppState::new(registry));
    let http = config.http();
    let listener = tokio::net::TcpListener::bind((http.host().as_str(), *http.port())).await?;
    info!(address = %listener.local_addr()?, "Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
