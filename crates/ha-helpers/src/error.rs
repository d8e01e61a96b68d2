//! Host-side error type

use ha_core::{EntityIdError, Platform};
use thiserror::Error;

/// Errors raised by the host while setting integrations up or adding entities
#[derive(Debug, Error)]
pub enum HomeAssistantError {
    #[error("integration '{0}' is not registered")]
    ComponentNotFound(String),

    #[error("integration '{domain}' has no {platform} platform")]
    PlatformNotFound { domain: String, platform: Platform },

    #[error("setup of '{domain}' failed")]
    SetupFailed {
        domain: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid entity id: {0}")]
    EntityId(#[from] EntityIdError),
}
