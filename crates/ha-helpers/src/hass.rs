//! The runtime handle passed to every integration

use std::any::Any;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use ha_auth::AuthStore;
use ha_core::Platform;
use ha_state_store::StateStore;
use tracing::{error, info, warn};

use crate::config::ConfigType;
use crate::entity_platform::EntityPlatform;
use crate::error::HomeAssistantError;
use crate::integration::{Component, PlatformSetup};

type DataSlot = Arc<dyn Any + Send + Sync>;

/// The running host
///
/// Holds the published states, the account store, one data slot per
/// integration domain and the registry of integrations and their platforms.
pub struct HomeAssistant {
    /// Published entity states
    pub states: Arc<StateStore>,
    /// Accounts of the authentication subsystem
    pub auth: Arc<dyn AuthStore>,
    /// Per-domain integration data, created in setup and dropped on unload
    data: DashMap<String, DataSlot>,
    components: DashMap<String, Arc<dyn Component>>,
    platform_setups: DashMap<(String, Platform), Arc<dyn PlatformSetup>>,
    entity_platforms: DashMap<(String, Platform), Arc<EntityPlatform>>,
    /// Loaded integrations ("ha_users") and platforms ("ha_users.sensor")
    loaded: DashSet<String>,
}

impl HomeAssistant {
    pub fn new(auth: Arc<dyn AuthStore>) -> Self {
        Self::with_states(auth, Arc::new(StateStore::new()))
    }

    pub fn with_states(auth: Arc<dyn AuthStore>, states: Arc<StateStore>) -> Self {
        Self {
            states,
            auth,
            data: DashMap::new(),
            components: DashMap::new(),
            platform_setups: DashMap::new(),
            entity_platforms: DashMap::new(),
            loaded: DashSet::new(),
        }
    }

    /// The slot for `domain`, created with `T::default()` if missing
    ///
    /// Returns `None` if the slot already holds a different type.
    pub fn data_setdefault<T>(&self, domain: &str) -> Option<Arc<T>>
    where
        T: Default + Send + Sync + 'static,
    {
        let slot = self
            .data
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(T::default()) as DataSlot)
            .clone();
        slot.downcast::<T>().ok()
    }

    /// The slot for `domain`, if it exists and holds a `T`
    pub fn data<T>(&self, domain: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let slot = self.data.get(domain)?.clone();
        slot.downcast::<T>().ok()
    }

    pub fn has_data(&self, domain: &str) -> bool {
        self.data.contains_key(domain)
    }

    /// Drop the slot for `domain`
    pub fn remove_data(&self, domain: &str) -> bool {
        self.data.remove(domain).is_some()
    }

    pub fn register_component(&self, component: Arc<dyn Component>) {
        let domain = component.domain().to_string();
        self.components.insert(domain.clone(), component);
        info!("Registered integration: {}", domain);
    }

    pub fn register_platform(
        &self,
        domain: &str,
        platform: Platform,
        setup: Arc<dyn PlatformSetup>,
    ) {
        self.platform_setups
            .insert((domain.to_string(), platform), setup);
    }

    pub(crate) fn platform_setup(
        &self,
        domain: &str,
        platform: Platform,
    ) -> Option<Arc<dyn PlatformSetup>> {
        self.platform_setups
            .get(&(domain.to_string(), platform))
            .map(|s| Arc::clone(s.value()))
    }

    /// The loaded entity platform of `domain`
    pub fn entity_platform(&self, domain: &str, platform: Platform) -> Option<Arc<EntityPlatform>> {
        self.entity_platforms
            .get(&(domain.to_string(), platform))
            .map(|p| Arc::clone(p.value()))
    }

    pub(crate) fn platform_loaded(&self, entity_platform: Arc<EntityPlatform>) {
        let domain = entity_platform.domain().to_string();
        let platform = entity_platform.platform();
        self.loaded.insert(format!("{}.{}", domain, platform));
        self.entity_platforms.insert((domain, platform), entity_platform);
    }

    /// Forget the entity platform of `domain`, returning it for reset
    pub fn take_entity_platform(
        &self,
        domain: &str,
        platform: Platform,
    ) -> Option<Arc<EntityPlatform>> {
        self.loaded.remove(&format!("{}.{}", domain, platform));
        self.entity_platforms
            .remove(&(domain.to_string(), platform))
            .map(|(_, p)| p)
    }

    /// Whether an integration ("ha_users") or platform ("ha_users.sensor") is loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    /// Loaded integrations, sorted; platforms are left out
    pub fn loaded_components(&self) -> Vec<String> {
        let mut loaded: Vec<String> = self
            .loaded
            .iter()
            .filter(|name| !name.contains('.'))
            .map(|name| name.key().clone())
            .collect();
        loaded.sort();
        loaded
    }

    /// Run the setup hook of the integration registered for `domain`
    pub async fn setup_component(
        self: &Arc<Self>,
        domain: &str,
        config: &ConfigType,
    ) -> Result<bool, HomeAssistantError> {
        if self.is_loaded(domain) {
            return Ok(true);
        }

        let component = self
            .components
            .get(domain)
            .map(|c| Arc::clone(c.value()))
            .ok_or_else(|| HomeAssistantError::ComponentNotFound(domain.to_string()))?;

        info!("Setting up {}", domain);
        match component.setup(self, config).await {
            Ok(true) => {
                self.loaded.insert(domain.to_string());
                info!("Setup of domain {} complete", domain);
                Ok(true)
            }
            Ok(false) => {
                warn!("Integration {} did not set up", domain);
                Ok(false)
            }
            Err(err) => {
                error!("Error during setup of component {}: {:?}", domain, err);
                Err(HomeAssistantError::SetupFailed {
                    domain: domain.to_string(),
                    source: err,
                })
            }
        }
    }

    /// Set up every registered integration that has a block in `config`
    ///
    /// Failures are logged and reported per domain; one failing
    /// integration does not stop the others.
    pub async fn setup_configured(
        self: &Arc<Self>,
        config: &ConfigType,
    ) -> Vec<(String, Result<bool, HomeAssistantError>)> {
        let mut results = Vec::new();
        for domain in config.domains() {
            if !self.components.contains_key(&domain) {
                continue;
            }
            let result = self.setup_component(&domain, config).await;
            results.push((domain, result));
        }
        results
    }

    /// Run the unload hook of a loaded integration
    pub async fn unload_component(self: &Arc<Self>, domain: &str) -> Result<bool, HomeAssistantError> {
        if !self.is_loaded(domain) {
            return Ok(true);
        }

        let component = self
            .components
            .get(domain)
            .map(|c| Arc::clone(c.value()))
            .ok_or_else(|| HomeAssistantError::ComponentNotFound(domain.to_string()))?;

        match component.unload(self).await {
            Ok(unloaded) => {
                if unloaded {
                    self.loaded.remove(domain);
                    info!("Unloaded {}", domain);
                }
                Ok(unloaded)
            }
            Err(err) => {
                error!("Error unloading {}: {:?}", domain, err);
                Err(HomeAssistantError::SetupFailed {
                    domain: domain.to_string(),
                    source: err,
                })
            }
        }
    }
}
