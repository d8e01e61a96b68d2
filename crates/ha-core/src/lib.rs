//! Core types for the Home Assistant host
//!
//! This crate provides the value types that the host runtime and the
//! integrations running inside it share: EntityId, State, Context and the
//! Platform an entity belongs to.

mod context;
mod entity_id;
mod platform;
mod state;

pub use context::Context;
pub use entity_id::{slugify, EntityId, EntityIdError};
pub use platform::Platform;
pub use state::State;

/// Longer state values are published as `unknown`
pub const MAX_STATE_LENGTH: usize = 255;

/// State value published for entities that have no value yet
pub const STATE_UNKNOWN: &str = "unknown";

/// State value published for entities whose data source is failing
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Attribute key carrying an entity's display name
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";

/// Payloads broadcast by the state store
pub mod events {
    use super::*;

    /// Payload of a `state_changed` broadcast
    ///
    /// `old_state` is `None` when the entity is first written, `new_state`
    /// is `None` when the entity is removed.
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
        pub context: Context,
    }
}
