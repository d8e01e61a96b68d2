//! Contracts between the host and an integration

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConfigType;
use crate::entity_platform::EntityPlatform;
use crate::hass::HomeAssistant;

/// Payload forwarded by `discovery::load_platform` to a platform
pub type DiscoveryInfo = serde_json::Map<String, serde_json::Value>;

/// An integration's top-level setup hook
#[async_trait]
pub trait Component: Send + Sync {
    /// The domain this integration is configured and stored under
    fn domain(&self) -> &str;

    /// Set the integration up. Returning `Ok(false)` marks setup as failed
    /// without an error to report.
    async fn setup(&self, hass: &Arc<HomeAssistant>, config: &ConfigType) -> anyhow::Result<bool>;

    /// Tear down whatever `setup` created
    async fn unload(&self, _hass: &Arc<HomeAssistant>) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// An integration's setup hook for one entity platform
#[async_trait]
pub trait PlatformSetup: Send + Sync {
    /// Create the platform's entities and hand them to `platform`
    async fn setup_platform(
        &self,
        hass: &Arc<HomeAssistant>,
        config: &ConfigType,
        platform: &EntityPlatform,
        discovery_info: Option<&DiscoveryInfo>,
    ) -> anyhow::Result<()>;
}
