//! Home Assistant Rust Server
//!
//! Loads `configuration.yaml` from the config directory (first argument,
//! `config` by default), sets up the configured integrations and runs until
//! interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ha_auth::MemoryAuthStore;
use ha_helpers::{ConfigType, HomeAssistant};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const CONFIG_FILE: &str = "configuration.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Home Assistant (Rust)");

    let config_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "config".into()));
    let config_path = config_dir.join(CONFIG_FILE);
    let config = ConfigType::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let hass = Arc::new(HomeAssistant::new(Arc::new(MemoryAuthStore::new_onboarded())));
    ha_users::register(&hass);

    info!("Home Assistant initialized");

    for (domain, result) in hass.setup_configured(&config).await {
        match result {
            Ok(true) => {}
            Ok(false) => warn!("Integration {} did not set up", domain),
            Err(err) => error!("Setup of {} failed: {:#}", domain, err),
        }
    }

    for state in hass.states.all() {
        info!(entity_id = %state.entity_id, state = %state.state, "Entity");
    }

    info!("Home Assistant is running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    for domain in hass.loaded_components() {
        if let Err(err) = hass.unload_component(&domain).await {
            error!("Unloading {} failed: {:#}", domain, err);
        }
    }

    Ok(())
}
