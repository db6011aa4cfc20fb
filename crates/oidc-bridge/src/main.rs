//! oidc-bridge entry point
//!
//! Parses configuration, performs discovery against the issuer, then serves
//! the ingress and egress check listeners until SIGINT or SIGTERM.

#![warn(clippy::all)]

use std::sync::Arc;

use clap::Parser;
use oidc_bridge::server;
use oidc_bridge::{
    BridgeConfig, BridgeResult, Cli, EgressTranslator, Gateway, IngressTranslator,
};
use oidc_bridge_idp::{CachingProvider, IdentityProvider, OidcClient};
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> BridgeResult<()> {
    let config = BridgeConfig::try_from(cli)?;
    config.log.init()?;

    // No degraded mode: discovery failure stops the process
    let client = OidcClient::initialize(config.idp.clone()).await?;
    let provider: Arc<dyn IdentityProvider> = match config.token_cache {
        Some(cache) => {
            info!(
                "Token cache enabled (refresh margin: {:?})",
                cache.refresh_margin
            );
            Arc::new(CachingProvider::with_config(client, cache))
        }
        None => Arc::new(client),
    };

    let ingress = Arc::new(Gateway::new(
        Arc::new(IngressTranslator::new(
            Arc::clone(&provider),
            config.gateway.identity_header.clone(),
        )),
        config.gateway.clone(),
    ));
    let egress = Arc::new(Gateway::new(
        Arc::new(EgressTranslator::new(provider)),
        config.gateway.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    tokio::try_join!(
        server::serve(config.ingress_addr, ingress, wait_for(shutdown_rx.clone())),
        server::serve(config.egress_addr, egress, wait_for(shutdown_rx)),
    )?;

    info!("Listeners stopped");
    Ok(())
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("SIGINT received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}
