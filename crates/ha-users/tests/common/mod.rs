//! Shared harness for the ha_users integration tests
//!
//! Builds an isolated host with the integration registered and an account
//! store whose reads can be made to fail on demand.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ha_auth::{AuthError, AuthResult, AuthStore, Credential, Group, MemoryAuthStore, User};
use ha_core::State;
use ha_helpers::{ConfigType, HomeAssistant};

/// Account store that fails every read while `failing` is set
#[derive(Default)]
pub struct FlakyAuthStore {
    pub inner: MemoryAuthStore,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl FlakyAuthStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            inner: MemoryAuthStore::with_users(users),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get_users` calls, failed ones included
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthStore for FlakyAuthStore {
    async fn get_users(&self) -> AuthResult<Vec<User>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("auth store offline".to_string()));
        }
        self.inner.get_users().await
    }
}

/// A host with ha_users registered, reading accounts from a [`FlakyAuthStore`]
pub struct TestHass {
    pub hass: Arc<HomeAssistant>,
    pub auth: Arc<FlakyAuthStore>,
}

impl TestHass {
    pub fn new(users: Vec<User>) -> Self {
        let auth = Arc::new(FlakyAuthStore::with_users(users));
        let hass = Arc::new(HomeAssistant::new(auth.clone()));
        ha_users::register(&hass);
        Self { hass, auth }
    }

    /// Run setup with `yaml` as configuration.yaml
    pub async fn setup(&self, yaml: &str) -> bool {
        let config = ConfigType::from_yaml_str(yaml).expect("Invalid test configuration");
        self.hass
            .setup_component(ha_users::DOMAIN, &config)
            .await
            .expect("ha_users setup failed")
    }

    pub fn get_state(&self, entity_id: &str) -> Option<State> {
        self.hass.states.get(entity_id)
    }

    /// Assert that an entity is in a specific state
    pub fn assert_state(&self, entity_id: &str, expected: &str) {
        let state = self.hass.states.get_state(entity_id);
        assert_eq!(
            state.as_deref(),
            Some(expected),
            "Expected entity {} to be in state '{}', but was {:?}",
            entity_id,
            expected,
            state
        );
    }

    /// Entity ids of every published sensor, sorted
    pub fn sensor_ids(&self) -> Vec<String> {
        let mut ids = self.hass.states.entity_ids("sensor");
        ids.sort();
        ids
    }
}

/// An account with a fixed id and no optional fields
pub fn user(id: &str, name: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: name.map(str::to_string),
        is_owner: false,
        is_active: true,
        system_generated: false,
        local_only: None,
        groups: Vec::new(),
        credentials: None,
    }
}

/// The owner account of the end-to-end scenario
pub fn alice() -> User {
    User {
        is_owner: true,
        groups: vec![Group::new("g1")],
        ..user("abc12345", Some("Alice"))
    }
}

/// A regular account with a password
pub fn bob() -> User {
    User {
        local_only: Some(true),
        groups: vec![Group::new("system-users")],
        credentials: Some(vec![Credential::homeassistant()]),
        ..user("bob67890", Some("Bob Builder"))
    }
}
