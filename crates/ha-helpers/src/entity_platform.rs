//! Entities one integration provides for one platform

use std::collections::HashSet;
use std::sync::Arc;

use ha_core::{EntityId, Platform};
use ha_state_store::StateStore;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::entity::{Entity, EntityHandle};
use crate::error::HomeAssistantError;

struct AddedEntity {
    entity: Arc<dyn Entity>,
    handle: EntityHandle,
}

/// The `sensor` entities of `ha_users`, for example
pub struct EntityPlatform {
    /// Integration providing the entities
    domain: String,
    platform: Platform,
    states: Arc<StateStore>,
    entities: Mutex<Vec<AddedEntity>>,
}

impl EntityPlatform {
    pub fn new(domain: impl Into<String>, platform: Platform, states: Arc<StateStore>) -> Self {
        Self {
            domain: domain.into(),
            platform,
            states,
            entities: Mutex::new(Vec::new()),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Add entities and publish their initial state
    ///
    /// With `update_before_add` each entity's `update()` runs first and an
    /// entity whose update fails is not added. An entity repeating a unique
    /// id already present on this platform is skipped.
    pub async fn add_entities(
        &self,
        entities: Vec<Arc<dyn Entity>>,
        update_before_add: bool,
    ) -> Result<Vec<EntityId>, HomeAssistantError> {
        let mut ready = Vec::with_capacity(entities.len());
        for entity in entities {
            if update_before_add {
                if let Err(err) = entity.update().await {
                    error!(
                        "Error adding entity {:?} for {}: {:#}",
                        entity.name(),
                        self.domain,
                        err
                    );
                    continue;
                }
            }
            ready.push(entity);
        }

        let mut added = self.entities.lock().await;
        let mut unique_ids: HashSet<String> = added
            .iter()
            .filter_map(|e| e.entity.unique_id())
            .collect();
        let mut entity_ids = Vec::with_capacity(ready.len());

        for entity in ready {
            if let Some(unique_id) = entity.unique_id() {
                if !unique_ids.insert(unique_id.clone()) {
                    error!(
                        "Platform {} does not generate unique IDs. ID {} already exists - ignoring {}.{}",
                        self.domain,
                        unique_id,
                        self.platform,
                        unique_id
                    );
                    continue;
                }
            }

            let entity_id = self.generate_entity_id(entity.as_ref(), &added)?;
            let handle = EntityHandle::new(entity_id.clone(), Arc::clone(&self.states));

            Arc::clone(&entity).added_to_hass(handle.clone());
            handle.write_state(entity.as_ref());
            debug!(entity_id = %entity_id, domain = %self.domain, "Added entity");

            entity_ids.push(entity_id);
            added.push(AddedEntity { entity, handle });
        }

        info!(
            "Added {} {} entities for {}",
            entity_ids.len(),
            self.platform,
            self.domain
        );
        Ok(entity_ids)
    }

    /// `<platform>.<slug>`, suffixed `_2`, `_3`, ... until unused
    fn generate_entity_id(
        &self,
        entity: &dyn Entity,
        added: &[AddedEntity],
    ) -> Result<EntityId, HomeAssistantError> {
        let suggestion = entity
            .suggested_object_id()
            .or_else(|| entity.name())
            .unwrap_or_else(|| format!("{} {}", self.domain, self.platform));
        let preferred = EntityId::from_suggestion(self.platform.as_str(), &suggestion)?;

        let taken = |candidate: &EntityId| {
            let key = candidate.to_string();
            self.states.contains(&key) || added.iter().any(|e| e.handle.entity_id() == candidate)
        };

        if !taken(&preferred) {
            return Ok(preferred);
        }

        let mut tries = 2;
        loop {
            let candidate = EntityId::new(
                self.platform.as_str(),
                format!("{}_{}", preferred.object_id(), tries),
            )?;
            if !taken(&candidate) {
                return Ok(candidate);
            }
            tries += 1;
        }
    }

    /// Entity ids of everything added so far, in order
    pub async fn entity_ids(&self) -> Vec<EntityId> {
        self.entities
            .lock()
            .await
            .iter()
            .map(|e| e.handle.entity_id().clone())
            .collect()
    }

    /// Remove every entity and its published state
    pub async fn reset(&self) {
        let mut added = self.entities.lock().await;
        for AddedEntity { entity, handle } in added.drain(..) {
            entity.will_remove_from_hass();
            handle.remove_state();
        }
        debug!(domain = %self.domain, platform = %self.platform, "Platform reset");
    }
}
