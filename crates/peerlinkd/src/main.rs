//! peerlinkd - peerlink daemon
//!
//! Usage:
//!   peerlinkd --config config/app-a.toml [--bind ADDR] [--peer-url URL] [--log-json]
//!
//! Every flag can also be set through its `PEERLINK_*` environment variable.
//! Exits non-zero if configuration or TLS material is unusable.

use clap::Parser;
use peerlinkd::{Cli, Daemon};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    tracing::info!("Starting peerlinkd");

    let config = cli.load_config()?;
    tracing::info!(
        config = %cli.config.display(),
        service = %config.service.name,
        "Loaded configuration"
    );

    let daemon = Daemon::build(config)?;
    let listener = daemon.bind().await?;
    tracing::info!("Listening on https://{}", listener.local_addr()?);

    let stats = daemon.stats();
    daemon.serve(listener, shutdown_signal()).await?;

    tracing::info!(
        accepted = stats.accepted(),
        handshakes = stats.handshakes(),
        failed_handshakes = stats.failed_handshakes(),
        "Shut down"
    );
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "peerlinkd=info,peerlink_api=info,peerlink_proxy=info,peerlink_client=info".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
