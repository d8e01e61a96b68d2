//! Tests for entity platforms, platform loading and component setup

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ha_auth::MemoryAuthStore;
use ha_core::Platform;
use ha_helpers::discovery::load_platform;
use ha_helpers::{
    Component, ConfigType, DiscoveryInfo, Entity, EntityHandle, EntityPlatform, HomeAssistant,
    HomeAssistantError, PlatformSetup,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

struct StaticEntity {
    unique_id: Option<String>,
    name: String,
    value: Mutex<String>,
    available: AtomicBool,
    added: AtomicUsize,
    removed: AtomicUsize,
}

impl StaticEntity {
    fn new(unique_id: Option<&str>, name: &str, value: &str) -> Arc<Self> {
        Arc::new(Self {
            unique_id: unique_id.map(str::to_string),
            name: name.to_string(),
            value: Mutex::new(value.to_string()),
            available: AtomicBool::new(true),
            added: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Entity for StaticEntity {
    fn unique_id(&self) -> Option<String> {
        self.unique_id.clone()
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn state(&self) -> Option<String> {
        Some(self.value.lock().unwrap().clone())
    }

    fn extra_state_attributes(&self) -> HashMap<String, Value> {
        HashMap::from([("source".to_string(), json!("test"))])
    }

    fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn update(&self) -> anyhow::Result<()> {
        *self.value.lock().unwrap() = "updated".to_string();
        Ok(())
    }

    fn added_to_hass(self: Arc<Self>, _handle: EntityHandle) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }

    fn will_remove_from_hass(&self) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

fn hass() -> Arc<HomeAssistant> {
    Arc::new(HomeAssistant::new(Arc::new(MemoryAuthStore::new())))
}

#[tokio::test]
async fn test_add_entities_publishes_state() {
    let hass = hass();
    let platform = EntityPlatform::new("demo", Platform::Sensor, Arc::clone(&hass.states));
    let entity = StaticEntity::new(Some("demo_1"), "Demo Value", "42");

    let ids = assert_ok!(platform.add_entities(vec![entity.clone()], false).await);

    assert_eq!(ids[0].to_string(), "sensor.demo_value");
    assert_eq!(entity.added.load(Ordering::SeqCst), 1);

    let state = hass.states.get("sensor.demo_value").unwrap();
    assert_eq!(state.state, "42");
    assert_eq!(state.attribute::<String>("source").as_deref(), Some("test"));
    assert_eq!(
        state.attribute::<String>("friendly_name").as_deref(),
        Some("Demo Value")
    );
}

#[tokio::test]
async fn test_update_before_add() {
    let hass = hass();
    let platform = EntityPlatform::new("demo", Platform::Sensor, Arc::clone(&hass.states));

    assert_ok!(
        platform
            .add_entities(vec![StaticEntity::new(None, "Demo", "initial")], true)
            .await
    );
    assert_eq!(hass.states.get_state("sensor.demo").as_deref(), Some("updated"));
}

#[tokio::test]
async fn test_entity_id_collision_and_duplicate_unique_id() {
    let hass = hass();
    let platform = EntityPlatform::new("demo", Platform::Sensor, Arc::clone(&hass.states));

    let ids = assert_ok!(
        platform
            .add_entities(
                vec![
                    StaticEntity::new(Some("a"), "Same", "1"),
                    StaticEntity::new(Some("b"), "Same", "2"),
                    StaticEntity::new(Some("a"), "Other", "3"),
                ],
                false,
            )
            .await
    );

    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    assert_eq!(ids, vec!["sensor.same", "sensor.same_2"]);
    assert!(!hass.states.contains("sensor.other"));
}

#[tokio::test]
async fn test_unavailable_entity_hides_value() {
    let hass = hass();
    let platform = EntityPlatform::new("demo", Platform::Sensor, Arc::clone(&hass.states));
    let entity = StaticEntity::new(None, "Demo", "42");
    entity.available.store(false, Ordering::SeqCst);

    assert_ok!(platform.add_entities(vec![entity], false).await);

    let state = hass.states.get("sensor.demo").unwrap();
    assert!(state.is_unavailable());
    assert!(state.attribute::<String>("source").is_none());
    assert_eq!(state.attributes.len(), 1);
}

#[tokio::test]
async fn test_reset_removes_states() {
    let hass = hass();
    let platform = EntityPlatform::new("demo", Platform::Sensor, Arc::clone(&hass.states));
    let entity = StaticEntity::new(None, "Demo", "42");
    assert_ok!(platform.add_entities(vec![entity.clone()], false).await);

    platform.reset().await;

    assert_eq!(entity.removed.load(Ordering::SeqCst), 1);
    assert!(hass.states.entity_ids("sensor").is_empty());
    assert!(platform.entity_ids().await.is_empty());
}

/// Adds one entity, then fails if asked to
struct DemoPlatform {
    fail: bool,
    seen_discovery: Mutex<Option<DiscoveryInfo>>,
}

#[async_trait]
impl PlatformSetup for DemoPlatform {
    async fn setup_platform(
        &self,
        _hass: &Arc<HomeAssistant>,
        _config: &ConfigType,
        platform: &EntityPlatform,
        discovery_info: Option<&DiscoveryInfo>,
    ) -> anyhow::Result<()> {
        *self.seen_discovery.lock().unwrap() = discovery_info.cloned();
        platform
            .add_entities(vec![StaticEntity::new(None, "Demo", "42")], false)
            .await?;
        if self.fail {
            anyhow::bail!("demo platform broke");
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_load_platform_success() {
    let hass = hass();
    let setup = Arc::new(DemoPlatform {
        fail: false,
        seen_discovery: Mutex::new(None),
    });
    hass.register_platform("demo", Platform::Sensor, setup.clone());

    assert_ok!(
        load_platform(
            &hass,
            Platform::Sensor,
            "demo",
            DiscoveryInfo::new(),
            &ConfigType::empty()
        )
        .await
    );

    assert!(hass.is_loaded("demo.sensor"));
    assert!(hass.loaded_components().is_empty());
    assert_eq!(setup.seen_discovery.lock().unwrap().as_ref().map(|d| d.len()), Some(0));
    assert!(hass.states.contains("sensor.demo"));
    assert!(hass.entity_platform("demo", Platform::Sensor).is_some());
}

#[tokio::test]
async fn test_load_platform_failure_leaves_nothing() {
    let hass = hass();
    hass.register_platform(
        "demo",
        Platform::Sensor,
        Arc::new(DemoPlatform {
            fail: true,
            seen_discovery: Mutex::new(None),
        }),
    );

    let err = assert_err!(
        load_platform(
            &hass,
            Platform::Sensor,
            "demo",
            DiscoveryInfo::new(),
            &ConfigType::empty()
        )
        .await
    );

    assert!(matches!(err, HomeAssistantError::SetupFailed { .. }));
    assert!(!hass.is_loaded("demo.sensor"));
    assert!(!hass.states.contains("sensor.demo"));
    assert!(hass.entity_platform("demo", Platform::Sensor).is_none());
}

#[tokio::test]
async fn test_load_unknown_platform() {
    let hass = hass();
    let err = assert_err!(
        load_platform(
            &hass,
            Platform::Sensor,
            "missing",
            DiscoveryInfo::new(),
            &ConfigType::empty()
        )
        .await
    );
    assert!(matches!(err, HomeAssistantError::PlatformNotFound { .. }));
}

struct FlagComponent {
    setups: AtomicUsize,
}

#[async_trait]
impl Component for FlagComponent {
    fn domain(&self) -> &str {
        "flag"
    }

    async fn setup(&self, _hass: &Arc<HomeAssistant>, config: &ConfigType) -> anyhow::Result<bool> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        Ok(config.has_domain("flag"))
    }
}

#[tokio::test]
async fn test_setup_component_runs_once() {
    let hass = hass();
    let component = Arc::new(FlagComponent {
        setups: AtomicUsize::new(0),
    });
    hass.register_component(component.clone());
    let config = ConfigType::from_yaml_str("flag:\nother:\n").unwrap();

    let results = hass.setup_configured(&config).await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0].1, Ok(true)));

    assert_ok!(hass.setup_component("flag", &config).await);
    assert_eq!(component.setups.load(Ordering::SeqCst), 1);
    assert!(hass.is_loaded("flag"));
    assert_eq!(hass.loaded_components(), vec!["flag"]);

    assert_ok!(hass.unload_component("flag").await);
    assert!(!hass.is_loaded("flag"));
}

#[tokio::test]
async fn test_setup_unknown_component() {
    let hass = hass();
    let err = assert_err!(hass.setup_component("nope", &ConfigType::empty()).await);
    assert!(matches!(err, HomeAssistantError::ComponentNotFound(_)));
}
