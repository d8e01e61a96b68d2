//! One sensor per account

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use anyhow::Context as _;
use async_trait::async_trait;
use ha_helpers::{
    ConfigType, DiscoveryInfo, Entity, EntityHandle, EntityPlatform, HomeAssistant, ListenerId,
    PlatformSetup,
};
use serde_json::{json, Value};
use tracing::info;

use crate::coordinator::{UserCoordinator, UserFetcher};
use crate::record::UserRecord;
use crate::setup::HaUsersData;
use crate::DOMAIN;

#[derive(Debug, Clone, PartialEq)]
struct SensorValues {
    native_value: String,
    attributes: HashMap<String, Value>,
}

impl From<&UserRecord> for SensorValues {
    fn from(record: &UserRecord) -> Self {
        let attributes = HashMap::from([
            ("user_id".to_string(), json!(record.id)),
            ("is_owner".to_string(), json!(record.is_owner)),
            ("is_active".to_string(), json!(record.is_active)),
            ("local_only".to_string(), json!(record.local_only)),
            ("system_generated".to_string(), json!(record.system_generated)),
            ("group_ids".to_string(), json!(record.group_ids)),
            ("has_credentials".to_string(), json!(record.has_credentials)),
        ]);

        Self {
            native_value: record.friendly_name(),
            attributes,
        }
    }
}

/// Mirrors one account's record
///
/// The tag (`ha_user_<name>`) is derived once, from the record the sensor
/// is created with, and serves as unique id, object id and name. Renaming
/// the account later changes the value, never the tag.
pub struct UserSensor {
    coordinator: Arc<UserCoordinator>,
    user_id: String,
    tag: String,
    values: RwLock<SensorValues>,
    handle: OnceLock<EntityHandle>,
    listener: Mutex<Option<ListenerId>>,
}

impl UserSensor {
    pub fn new(coordinator: Arc<UserCoordinator>, record: &UserRecord) -> Self {
        Self {
            coordinator,
            user_id: record.id.clone(),
            tag: record.entity_tag(),
            values: RwLock::new(SensorValues::from(record)),
            handle: OnceLock::new(),
            listener: Mutex::new(None),
        }
    }

    /// Id of the account this sensor follows
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn native_value(&self) -> String {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .native_value
            .clone()
    }

    pub fn attributes(&self) -> HashMap<String, Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .attributes
            .clone()
    }

    /// Take value and attributes from `record`
    pub fn update_from_record(&self, record: &UserRecord) {
        *self.values.write().unwrap_or_else(PoisonError::into_inner) = SensorValues::from(record);
    }

    /// This sensor's record in the coordinator's current snapshot
    pub fn find_record(&self) -> Option<UserRecord> {
        self.coordinator
            .data()?
            .iter()
            .find(|record| record.id == self.user_id)
            .cloned()
    }

    /// Re-read the snapshot after a refresh
    ///
    /// An account that disappeared keeps its last-known values.
    pub fn handle_coordinator_update(&self) {
        if let Some(record) = self.find_record() {
            self.update_from_record(&record);
        }
        if let Some(handle) = self.handle.get() {
            handle.write_state(self);
        }
    }
}

#[async_trait]
impl Entity for UserSensor {
    fn unique_id(&self) -> Option<String> {
        Some(self.tag.clone())
    }

    fn name(&self) -> Option<String> {
        Some(self.tag.clone())
    }

    fn suggested_object_id(&self) -> Option<String> {
        Some(self.tag.clone())
    }

    fn state(&self) -> Option<String> {
        Some(self.native_value())
    }

    fn extra_state_attributes(&self) -> HashMap<String, Value> {
        self.attributes()
    }

    fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    async fn update(&self) -> anyhow::Result<()> {
        self.coordinator.refresh().await?;
        Ok(())
    }

    fn added_to_hass(self: Arc<Self>, handle: EntityHandle) {
        // A second add would publish under two entity ids; keep the first
        if self.handle.set(handle).is_err() {
            return;
        }

        let sensor = Arc::downgrade(&self);
        let id = self.coordinator.add_listener(move || {
            if let Some(sensor) = sensor.upgrade() {
                sensor.handle_coordinator_update();
            }
        });
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    fn will_remove_from_hass(&self) {
        if let Some(id) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            self.coordinator.remove_listener(id);
        }
    }
}

/// Sets up one [`UserSensor`] per account
pub struct UserSensorPlatform;

#[async_trait]
impl PlatformSetup for UserSensorPlatform {
    async fn setup_platform(
        &self,
        hass: &Arc<HomeAssistant>,
        _config: &ConfigType,
        platform: &EntityPlatform,
        _discovery_info: Option<&DiscoveryInfo>,
    ) -> anyhow::Result<()> {
        info!("Setting up HA Users sensors");

        // Failures are logged with their chain by load_platform
        setup_sensors(hass, platform).await
    }
}

async fn setup_sensors(hass: &Arc<HomeAssistant>, platform: &EntityPlatform) -> anyhow::Result<()> {
    let data = hass
        .data::<HaUsersData>(DOMAIN)
        .with_context(|| format!("{} is not set up", DOMAIN))?;

    let coordinator = Arc::new(UserFetcher::coordinator(
        Arc::clone(&hass.auth),
        &data.config(),
    ));
    coordinator
        .refresh()
        .await
        .context("Initial fetch of users failed")?;

    let records = coordinator
        .data()
        .context("No user data after initial fetch")?;
    let entities: Vec<Arc<dyn Entity>> = records
        .iter()
        .map(|record| Arc::new(UserSensor::new(Arc::clone(&coordinator), record)) as Arc<dyn Entity>)
        .collect();

    info!("Created {} user sensors", entities.len());

    // Sensors already hold their first values; no update before adding
    platform.add_entities(entities, false).await?;
    data.set_coordinator(coordinator);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_auth::MemoryAuthStore;

    fn record(id: &str, name: Option<&str>) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            name: name.map(str::to_string),
            is_owner: false,
            is_active: true,
            system_generated: false,
            local_only: false,
            group_ids: vec!["system-users".to_string()],
            has_credentials: true,
        }
    }

    fn sensor(record: &UserRecord) -> UserSensor {
        let coordinator = Arc::new(UserFetcher::coordinator(
            Arc::new(MemoryAuthStore::new()),
            &Default::default(),
        ));
        UserSensor::new(coordinator, record)
    }

    #[test]
    fn test_update_from_record_is_idempotent() {
        let alice = record("abc12345", Some("Alice"));
        let sensor = sensor(&alice);

        sensor.update_from_record(&alice);
        let (value, attributes) = (sensor.native_value(), sensor.attributes());
        sensor.update_from_record(&alice);

        assert_eq!(sensor.native_value(), value);
        assert_eq!(sensor.attributes(), attributes);
        assert_eq!(attributes.len(), 7);
    }

    #[test]
    fn test_rename_keeps_tag() {
        let sensor = sensor(&record("abc12345", Some("Alice")));
        sensor.update_from_record(&record("abc12345", Some("Alicia")));

        assert_eq!(sensor.native_value(), "Alicia");
        assert_eq!(sensor.tag(), "ha_user_alice");
        assert_eq!(sensor.unique_id().as_deref(), Some("ha_user_alice"));
        assert_eq!(sensor.name().as_deref(), Some("ha_user_alice"));
    }

    #[test]
    fn test_no_snapshot_leaves_values() {
        let sensor = sensor(&record("abc12345", Some("Alice")));
        let before = (sensor.native_value(), sensor.attributes());

        assert!(sensor.find_record().is_none());
        sensor.handle_coordinator_update();

        assert_eq!((sensor.native_value(), sensor.attributes()), before);
    }
}
