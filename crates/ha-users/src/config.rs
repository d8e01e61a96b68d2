use std::time::Duration;

use ha_helpers::{ConfigError, ConfigResult, ConfigType};
use serde::Deserialize;

use crate::{DOMAIN, SCAN_INTERVAL_HOURS};

/// Longest accepted poll interval: one year
pub const MAX_SCAN_INTERVAL_HOURS: u64 = 24 * 365;

const SECS_PER_HOUR: u64 = 3600;

/// The `ha_users:` block of configuration.yaml
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HaUsersConfig {
    /// Hours between two polls of the auth store
    pub scan_interval_hours: u64,
}

impl Default for HaUsersConfig {
    fn default() -> Self {
        Self {
            scan_interval_hours: SCAN_INTERVAL_HOURS,
        }
    }
}

impl HaUsersConfig {
    /// Read and validate the block for this domain
    pub fn from_config(config: &ConfigType) -> ConfigResult<Self> {
        let parsed: Self = config.domain_config(DOMAIN)?;
        if !(1..=MAX_SCAN_INTERVAL_HOURS).contains(&parsed.scan_interval_hours) {
            return Err(ConfigError::InvalidValue {
                key: format!("{}.scan_interval_hours", DOMAIN),
                reason: format!(
                    "must be between 1 and {}, got {}",
                    MAX_SCAN_INTERVAL_HOURS, parsed.scan_interval_hours
                ),
            });
        }
        Ok(parsed)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_hours.saturating_mul(SECS_PER_HOUR))
    }
}
