//! Account types

use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub const GROUP_ID_ADMIN: &str = "system-admin";
pub const GROUP_ID_USER: &str = "system-users";

/// A group a user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// A credential linked to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub auth_provider_type: String,
    #[serde(default)]
    pub auth_provider_id: Option<String>,
}

impl Credential {
    /// A username/password credential from the built-in provider
    pub fn homeassistant() -> Self {
        Self {
            auth_provider_type: "homeassistant".to_string(),
            auth_provider_id: None,
        }
    }
}

/// A user in the auth system
///
/// `local_only` and `credentials` are optional because not every auth
/// backend tracks them; `None` means "not exposed", not "false"/"empty".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub system_generated: bool,
    #[serde(default)]
    pub local_only: Option<bool>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub credentials: Option<Vec<Credential>>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Create an active, non-owner user with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string().to_lowercase(),
            name: Some(name.into()),
            is_owner: false,
            is_active: true,
            system_generated: false,
            local_only: Some(false),
            groups: vec![Group::new(GROUP_ID_USER)],
            credentials: Some(Vec::new()),
        }
    }

    /// Create the owner account, member of the admin group with a password credential
    pub fn owner(name: impl Into<String>) -> Self {
        Self {
            is_owner: true,
            groups: vec![Group::new(GROUP_ID_ADMIN)],
            credentials: Some(vec![Credential::homeassistant()]),
            ..Self::new(name)
        }
    }

    /// Create a system-generated account (no name shown to people, no credentials)
    pub fn system(name: impl Into<String>) -> Self {
        Self {
            system_generated: true,
            groups: Vec::new(),
            ..Self::new(name)
        }
    }
}
