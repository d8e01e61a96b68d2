//! Helpers integrations are written against
//!
//! This crate is the framework side of an integration: the runtime handle
//! ([`HomeAssistant`]) with its per-domain data slots, YAML configuration,
//! the component/platform setup contracts, entity platforms that publish
//! entity state, and the [`DataUpdateCoordinator`] that polls a data source
//! on a fixed interval for a set of entities.

pub mod config;
pub mod discovery;
pub mod entity;
pub mod entity_platform;
mod error;
mod hass;
mod integration;
pub mod update_coordinator;

pub use config::{ConfigError, ConfigResult, ConfigType};
pub use entity::{Entity, EntityHandle};
pub use entity_platform::EntityPlatform;
pub use error::HomeAssistantError;
pub use hass::HomeAssistant;
pub use integration::{Component, DiscoveryInfo, PlatformSetup};
pub use update_coordinator::{DataUpdate, DataUpdateCoordinator, ListenerId, UpdateFailed};
