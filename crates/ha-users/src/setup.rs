//! Integration setup and unload

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context as _;
use async_trait::async_trait;
use ha_core::Platform;
use ha_helpers::discovery::load_platform;
use ha_helpers::{Component, ConfigType, DiscoveryInfo, HomeAssistant};
use tracing::info;

use crate::config::HaUsersConfig;
use crate::coordinator::UserCoordinator;
use crate::DOMAIN;

/// What the integration keeps in its `hass` data slot
#[derive(Default)]
pub struct HaUsersData {
    config: RwLock<HaUsersConfig>,
    coordinator: RwLock<Option<Arc<UserCoordinator>>>,
}

impl HaUsersData {
    pub fn config(&self) -> HaUsersConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_config(&self, config: HaUsersConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// The coordinator, once the sensor platform is set up
    pub fn coordinator(&self) -> Option<Arc<UserCoordinator>> {
        self.coordinator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_coordinator(&self, coordinator: Arc<UserCoordinator>) {
        *self.coordinator.write().unwrap_or_else(PoisonError::into_inner) = Some(coordinator);
    }

    fn take_coordinator(&self) -> Option<Arc<UserCoordinator>> {
        self.coordinator
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// The `ha_users` integration
pub struct HaUsersComponent;

#[async_trait]
impl Component for HaUsersComponent {
    fn domain(&self) -> &str {
        DOMAIN
    }

    async fn setup(&self, hass: &Arc<HomeAssistant>, config: &ConfigType) -> anyhow::Result<bool> {
        info!("Setting up Home Assistant Users integration");

        let data = hass
            .data_setdefault::<HaUsersData>(DOMAIN)
            .with_context(|| format!("hass data slot '{}' holds foreign data", DOMAIN))?;

        if !config.has_domain(DOMAIN) {
            return Ok(true);
        }

        data.set_config(HaUsersConfig::from_config(config)?);

        // A failed platform is logged by load_platform and stays unloaded;
        // the integration itself is still set up
        let _ = load_platform(
            hass,
            Platform::Sensor,
            DOMAIN,
            DiscoveryInfo::new(),
            config,
        )
        .await;

        Ok(true)
    }

    async fn unload(&self, hass: &Arc<HomeAssistant>) -> anyhow::Result<bool> {
        if let Some(coordinator) = hass
            .data::<HaUsersData>(DOMAIN)
            .and_then(|data| data.take_coordinator())
        {
            coordinator.shutdown();
        }

        if let Some(platform) = hass.take_entity_platform(DOMAIN, Platform::Sensor) {
            platform.reset().await;
        }

        hass.remove_data(DOMAIN);
        info!("Home Assistant Users integration unloaded");
        Ok(true)
    }
}
