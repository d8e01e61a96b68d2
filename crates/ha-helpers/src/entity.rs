//! The entity contract and the handle an entity publishes its state through

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ha_core::{Context, EntityId, State, ATTR_FRIENDLY_NAME, STATE_UNAVAILABLE, STATE_UNKNOWN};
use ha_state_store::StateStore;
use serde_json::Value;

/// An observable object with a value and attributes
///
/// Methods take `&self`; entities that change over time keep their values
/// behind interior mutability so the host can share them as `Arc<dyn Entity>`.
#[async_trait]
pub trait Entity: Send + Sync {
    /// Stable id used to recognise the entity across restarts
    fn unique_id(&self) -> Option<String> {
        None
    }

    /// Display name, published as `friendly_name`
    fn name(&self) -> Option<String> {
        None
    }

    /// Preferred object id; falls back to the name
    fn suggested_object_id(&self) -> Option<String> {
        None
    }

    /// Current value, `None` while unknown
    fn state(&self) -> Option<String>;

    fn extra_state_attributes(&self) -> HashMap<String, Value> {
        HashMap::new()
    }

    fn available(&self) -> bool {
        true
    }

    /// Fetch new data; called before adding when `update_before_add` is set
    async fn update(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once the entity has an entity id, before its first state write
    fn added_to_hass(self: Arc<Self>, _handle: EntityHandle) {}

    /// Called before the entity's state is removed
    fn will_remove_from_hass(&self) {}
}

/// Where an added entity writes its state
#[derive(Clone)]
pub struct EntityHandle {
    entity_id: EntityId,
    states: Arc<StateStore>,
}

impl EntityHandle {
    pub(crate) fn new(entity_id: EntityId, states: Arc<StateStore>) -> Self {
        Self { entity_id, states }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Publish the entity's current state
    ///
    /// An unavailable entity publishes `unavailable` and only its name;
    /// its own value and attributes are left out.
    pub fn write_state(&self, entity: &dyn Entity) -> State {
        let (state, mut attributes) = if entity.available() {
            (
                entity.state().unwrap_or_else(|| STATE_UNKNOWN.to_string()),
                entity.extra_state_attributes(),
            )
        } else {
            (STATE_UNAVAILABLE.to_string(), HashMap::new())
        };

        if let Some(name) = entity.name() {
            attributes.insert(ATTR_FRIENDLY_NAME.to_string(), Value::String(name));
        }

        self.states
            .set(self.entity_id.clone(), state, attributes, Context::new())
    }

    pub(crate) fn remove_state(&self) -> Option<State> {
        self.states.remove(&self.entity_id, Context::new())
    }
}
