//! Loading an integration's platform on its behalf

use std::sync::Arc;

use ha_core::Platform;
use tracing::{error, info, warn};

use crate::config::ConfigType;
use crate::entity_platform::EntityPlatform;
use crate::error::HomeAssistantError;
use crate::hass::HomeAssistant;
use crate::integration::DiscoveryInfo;

/// Load `platform` of the integration `domain`, forwarding `discovered`
///
/// The platform is only marked loaded if its setup succeeds. If setup
/// fails, every entity it already added is removed again and the error is
/// logged with its full chain before being returned.
pub async fn load_platform(
    hass: &Arc<HomeAssistant>,
    platform: Platform,
    domain: &str,
    discovered: DiscoveryInfo,
    hass_config: &ConfigType,
) -> Result<(), HomeAssistantError> {
    if hass.entity_platform(domain, platform).is_some() {
        warn!("{} platform for {} is already loaded", platform, domain);
        return Ok(());
    }

    let Some(setup) = hass.platform_setup(domain, platform) else {
        error!("Unable to find platform {} for {}", platform, domain);
        return Err(HomeAssistantError::PlatformNotFound {
            domain: domain.to_string(),
            platform,
        });
    };

    info!("Setting up {}.{}", domain, platform);
    let entity_platform = Arc::new(EntityPlatform::new(
        domain,
        platform,
        Arc::clone(&hass.states),
    ));

    match setup
        .setup_platform(hass, hass_config, &entity_platform, Some(&discovered))
        .await
    {
        Ok(()) => {
            hass.platform_loaded(entity_platform);
            Ok(())
        }
        Err(err) => {
            error!(
                "Error while setting up {} platform for {}: {:?}",
                platform, domain, err
            );
            entity_platform.reset().await;
            Err(HomeAssistantError::SetupFailed {
                domain: domain.to_string(),
                source: err,
            })
        }
    }
}
