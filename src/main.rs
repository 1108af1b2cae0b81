//! Stormbot - Discord companion bot for the Eternal Storm community
//!
//! Prefixed text commands for game stats (Minecraft, ARK, Satisfactory,
//! Lethal Company, Smite, Rocket League, Supercell titles), per-user
//! identifier registration, and a rock/paper/scissors voice mini-game.

mod common;
mod config;
mod discord;
mod minigame;
mod query;
mod stats;
mod store;

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info};

use config::load_and_validate;
use discord::{build_client, CommandRouter};
use stats::StatsGateway;
use store::{IdentityStore, ResponseCache};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real deployments set the environment directly.
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Stormbot v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = load_and_validate().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Set DISCORD_TOKEN and friends in the environment or a .env file.");
        e
    })?;
    let settings = Arc::new(settings);

    info!("Configuration loaded successfully");
    info!("  Command prefix: {}", settings.command_prefix);
    info!("  Data directory: {}", settings.data_dir.display());
    info!("  Minecraft server: {}", configured(settings.minecraft.is_some()));
    info!("  ARK server: {}", configured(settings.ark.is_some()));
    info!("  Satisfactory server: {}", configured(settings.satisfactory.is_some()));
    info!("  Lethal Company server: {}", configured(settings.lethal.is_some()));
    info!("  Tracker Network: {}", configured(settings.trn.is_some()));
    info!("  Rocket League API: {}", configured(settings.rocket_league.is_some()));

    let identities = Arc::new(IdentityStore::new(&settings.data_dir));
    let cache = Arc::new(ResponseCache::new(&settings.data_dir));

    let gateway = StatsGateway::new(settings.clone(), identities.clone(), cache)?;
    let router = Arc::new(CommandRouter::new(settings.clone(), gateway, identities));

    info!("Starting Discord client...");
    let mut client = build_client(&settings, router).await?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!("Discord client error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            shard_manager.shutdown_all().await;
        }
    }

    info!("Exiting...");
    Ok(())
}

fn configured(enabled: bool) -> &'static str {
    if enabled {
        "configured"
    } else {
        "not configured"
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
