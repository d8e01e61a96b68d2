//! Entity platforms an integration can provide entities for

use serde::{Deserialize, Serialize};
use std::fmt;

/// An entity platform, which is also the domain of the entity ids it creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Sensor,
}

impl Platform {
    /// The entity domain for this platform (e.g. "sensor")
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Sensor => "sensor",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
