//! Flat per-poll view of an account

use std::collections::HashSet;

use ha_auth::User;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ENTITY_PREFIX;

/// Length of the id prefix used when an account has no name
const SHORT_ID_LEN: usize = 8;

/// One account as seen by a single poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: Option<String>,
    pub is_owner: bool,
    pub is_active: bool,
    pub system_generated: bool,
    pub local_only: bool,
    pub group_ids: Vec<String>,
    pub has_credentials: bool,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            is_owner: user.is_owner,
            is_active: user.is_active,
            system_generated: user.system_generated,
            local_only: user.local_only.unwrap_or(false),
            group_ids: user.groups.iter().map(|g| g.id.clone()).collect(),
            has_credentials: user
                .credentials
                .as_ref()
                .is_some_and(|credentials| !credentials.is_empty()),
        }
    }
}

impl UserRecord {
    /// The name, unless missing or empty
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// First eight characters of the id
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(SHORT_ID_LEN) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }

    /// The sensor value: the name, or `User <short id>`
    pub fn friendly_name(&self) -> String {
        match self.display_name() {
            Some(name) => name.to_string(),
            None => format!("User {}", self.short_id()),
        }
    }

    /// `ha_user_<name>` lower-cased with spaces as underscores, or
    /// `ha_user_user_<short id>` for an account without a name
    pub fn entity_tag(&self) -> String {
        let username = match self.display_name() {
            Some(name) => name.to_string(),
            None => format!("user_{}", self.short_id()),
        };
        format!(
            "{}_{}",
            ENTITY_PREFIX,
            username.to_lowercase().replace(' ', "_")
        )
    }
}

/// Map accounts to records, keeping the store's order
///
/// Accounts without an id are dropped, and so is every account repeating
/// an id seen earlier in the same list.
pub fn records_from_users(users: &[User]) -> Vec<UserRecord> {
    let mut seen = HashSet::with_capacity(users.len());
    let mut records = Vec::with_capacity(users.len());

    for user in users {
        if user.id.is_empty() {
            warn!("Skipping user {:?} without an id", user.name);
            continue;
        }
        if !seen.insert(user.id.as_str()) {
            warn!("Skipping repeated user id {}", user.id);
            continue;
        }
        records.push(UserRecord::from(user));
    }

    records
}
