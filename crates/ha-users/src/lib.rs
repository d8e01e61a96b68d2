//! Home Assistant Users integration
//!
//! Polls the auth store on a fixed interval and publishes one
//! `sensor.ha_user_<name>` per account, with the account's flags, groups
//! and credential presence as attributes.
//!
//! ```yaml
//! # configuration.yaml
//! ha_users:
//!   scan_interval_hours: 1
//! ```

use std::sync::Arc;

use ha_core::Platform;
use ha_helpers::HomeAssistant;

mod config;
mod coordinator;
mod record;
mod sensor;
mod setup;

pub use config::{HaUsersConfig, MAX_SCAN_INTERVAL_HOURS};
pub use coordinator::{UserCoordinator, UserFetcher};
pub use record::{records_from_users, UserRecord};
pub use sensor::{UserSensor, UserSensorPlatform};
pub use setup::{HaUsersComponent, HaUsersData};

/// Domain the integration is configured and stored under
pub const DOMAIN: &str = "ha_users";

/// Default hours between two polls of the auth store
pub const SCAN_INTERVAL_HOURS: u64 = 1;

/// Prefix of every sensor's unique id and object id
pub const ENTITY_PREFIX: &str = "ha_user";

/// Make the integration and its sensor platform known to `hass`
pub fn register(hass: &HomeAssistant) {
    hass.register_component(Arc::new(HaUsersComponent));
    hass.register_platform(DOMAIN, Platform::Sensor, Arc::new(UserSensorPlatform));
}
