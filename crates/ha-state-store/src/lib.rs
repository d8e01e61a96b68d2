//! Entity state storage with domain indexing
//!
//! The StateStore holds the published state of every entity. Entities write
//! into it; anyone interested in changes subscribes to its `state_changed`
//! broadcast.

use dashmap::DashMap;
use ha_core::events::StateChangedData;
use ha_core::{Context, EntityId, State};
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace};

/// Default capacity of the state_changed channel
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// The state store tracks all published entity states
pub struct StateStore {
    /// All entity states keyed by entity_id string
    states: DashMap<String, State>,
    /// Index of entity_ids by domain, in insertion order
    domain_index: DashMap<String, Vec<String>>,
    /// state_changed subscribers
    changes: broadcast::Sender<StateChangedData>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a store whose state_changed channel buffers `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity);
        Self {
            states: DashMap::new(),
            domain_index: DashMap::new(),
            changes,
        }
    }

    /// Subscribe to state_changed events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChangedData> {
        self.changes.subscribe()
    }

    /// Set the state of an entity
    ///
    /// `last_changed` only moves when the value itself changed. Every write
    /// is broadcast, including writes that change nothing.
    #[instrument(skip(self, state, attributes, context), fields(entity_id = %entity_id))]
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
        context: Context,
    ) -> State {
        let key = entity_id.to_string();
        let old_state = self.get(&key);

        let new_state = match &old_state {
            Some(existing) => existing.with_update(state, attributes, context.clone()),
            None => State::new(entity_id.clone(), state, attributes, context.clone()),
        };

        debug!(
            state = %new_state.state,
            changed = old_state.as_ref().map(|s| s.state != new_state.state).unwrap_or(true),
            "Setting entity state"
        );

        self.states.insert(key.clone(), new_state.clone());

        if old_state.is_none() {
            self.domain_index
                .entry(entity_id.domain().to_string())
                .or_default()
                .push(key);
        }

        // No receivers is fine
        let _ = self.changes.send(StateChangedData {
            entity_id,
            old_state,
            new_state: Some(new_state.clone()),
            context,
        });

        new_state
    }

    pub fn get(&self, entity_id: &str) -> Option<State> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    /// Just the value of an entity's state
    pub fn get_state(&self, entity_id: &str) -> Option<String> {
        self.states.get(entity_id).map(|s| s.state.clone())
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.states.contains_key(entity_id)
    }

    /// Entity ids of a domain, in the order they were first written
    pub fn entity_ids(&self, domain: &str) -> Vec<String> {
        self.domain_index
            .get(domain)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub fn all(&self) -> Vec<State> {
        self.states.iter().map(|r| r.value().clone()).collect()
    }

    /// Remove an entity's state, broadcasting `new_state: None`
    #[instrument(skip(self, context), fields(entity_id = %entity_id))]
    pub fn remove(&self, entity_id: &EntityId, context: Context) -> Option<State> {
        let key = entity_id.to_string();
        let (_, old_state) = self.states.remove(&key)?;

        trace!("Removing entity state");
        if let Some(mut ids) = self.domain_index.get_mut(entity_id.domain()) {
            ids.retain(|id| id != &key);
        }

        let _ = self.changes.send(StateChangedData {
            entity_id: entity_id.clone(),
            old_state: Some(old_state.clone()),
            new_state: None,
            context,
        });

        Some(old_state)
    }

    pub fn entity_count(&self) -> usize {
        self.states.len()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
