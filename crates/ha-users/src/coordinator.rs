//! Polling of the auth store

use std::sync::Arc;

use async_trait::async_trait;
use ha_auth::AuthStore;
use ha_helpers::{DataUpdate, DataUpdateCoordinator, UpdateFailed};
use tracing::debug;

use crate::config::HaUsersConfig;
use crate::record::{records_from_users, UserRecord};
use crate::DOMAIN;

/// Coordinator holding the latest list of user records
pub type UserCoordinator = DataUpdateCoordinator<UserFetcher>;

/// Lists the accounts of the auth store as records
pub struct UserFetcher {
    auth: Arc<dyn AuthStore>,
}

impl UserFetcher {
    pub fn new(auth: Arc<dyn AuthStore>) -> Self {
        Self { auth }
    }

    /// A coordinator polling `auth` at the configured interval
    pub fn coordinator(auth: Arc<dyn AuthStore>, config: &HaUsersConfig) -> UserCoordinator {
        DataUpdateCoordinator::new(DOMAIN, Some(config.scan_interval()), Self::new(auth))
    }
}

#[async_trait]
impl DataUpdate for UserFetcher {
    type Data = Vec<UserRecord>;

    async fn update_data(&self) -> Result<Vec<UserRecord>, UpdateFailed> {
        debug!("Fetching users from the auth store");

        let users = self
            .auth
            .get_users()
            .await
            .map_err(|err| UpdateFailed::with_source("Error fetching users", err))?;
        let records = records_from_users(&users);

        debug!("Found {} users", records.len());
        Ok(records)
    }
}
