//! Origin marker attached to every state write

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifies the write that produced a state
///
/// Every state write gets a fresh context; the `state_changed` event
/// carries the same context as the new state, so listeners can tell which
/// write they are looking at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    /// ULID, so contexts sort by creation time
    pub id: String,
}

impl Context {
    pub fn new() -> Self {
        Self {
            id: Ulid::new().to_string(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
