//! Coordinator that fetches data on a fixed interval for a set of listeners
//!
//! A coordinator owns exactly one snapshot of whatever its [`DataUpdate`]
//! produces. Each refresh replaces the snapshot as a whole; a failed refresh
//! keeps the previous one. Listeners (usually entities) are called
//! synchronously after every successful refresh, and once more when the
//! coordinator goes from healthy to failing so they can publish
//! "unavailable".

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// Error returned by a failed fetch
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UpdateFailed {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl UpdateFailed {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap the error that made the fetch fail
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// The fetch a coordinator runs on every refresh
#[async_trait]
pub trait DataUpdate: Send + Sync + 'static {
    type Data: Send + Sync + 'static;

    async fn update_data(&self) -> Result<Self::Data, UpdateFailed>;
}

/// Identifies a registered listener so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn() + Send + Sync>;

pub struct DataUpdateCoordinator<U: DataUpdate> {
    name: String,
    update_interval: Option<Duration>,
    updater: U,
    /// Current snapshot; replaced whole, never mutated in place
    data: RwLock<Option<Arc<U::Data>>>,
    last_update_success: AtomicBool,
    last_error: Mutex<Option<String>>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
    /// Held for the duration of a refresh so refreshes never overlap
    refresh_lock: tokio::sync::Mutex<()>,
    timer: Mutex<Option<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl<U: DataUpdate> DataUpdateCoordinator<U> {
    /// Create a coordinator. With `update_interval: None` it only refreshes
    /// when asked to.
    pub fn new(name: impl Into<String>, update_interval: Option<Duration>, updater: U) -> Self {
        Self {
            name: name.into(),
            update_interval,
            updater,
            data: RwLock::new(None),
            last_update_success: AtomicBool::new(true),
            last_error: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            refresh_lock: tokio::sync::Mutex::new(()),
            timer: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update_interval(&self) -> Option<Duration> {
        self.update_interval
    }

    pub fn updater(&self) -> &U {
        &self.updater
    }

    /// The current snapshot, `None` until the first successful refresh
    pub fn data(&self) -> Option<Arc<U::Data>> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the most recent refresh succeeded
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    /// Message of the error that made the most recent refresh fail
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch fresh data and replace the snapshot
    ///
    /// On failure the previous snapshot stays in place, the coordinator is
    /// marked as failing and the error is returned. Failures are logged
    /// here, once per outage.
    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        let _guard = self.refresh_lock.lock().await;
        let was_healthy = self.last_update_success();

        trace!(coordinator = %self.name, "Refreshing");
        match self.updater.update_data().await {
            Ok(data) => {
                *self.data.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(data));
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
                self.last_update_success.store(true, Ordering::SeqCst);

                if !was_healthy {
                    info!("Fetching {} data recovered", self.name);
                }
                self.update_listeners();
                Ok(())
            }
            Err(err) => {
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(err.to_string());
                self.last_update_success.store(false, Ordering::SeqCst);

                if was_healthy {
                    error!("Error fetching {} data: {}", self.name, ErrorChain(&err));
                    self.update_listeners();
                } else {
                    debug!("Error fetching {} data: {}", self.name, ErrorChain(&err));
                }
                Err(err)
            }
        }
    }

    /// Register a listener, starting the refresh timer if it is the first
    pub fn add_listener<F>(self: &Arc<Self>, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst));
        let first = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.push((id, Arc::new(listener)));
            listeners.len() == 1
        };

        if first {
            self.start_timer();
        }
        id
    }

    /// Remove a listener, stopping the refresh timer if none are left
    pub fn remove_listener(&self, id: ListenerId) {
        let empty = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|(listener_id, _)| *listener_id != id);
            listeners.is_empty()
        };

        if empty {
            self.stop_timer();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Call every listener
    pub fn update_listeners(&self) {
        // Listeners may add or remove listeners, so call them unlocked
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener();
        }
    }

    /// Whether the periodic refresh is currently scheduled
    pub fn is_scheduled(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop refreshing for good
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.stop_timer();
        debug!(coordinator = %self.name, "Coordinator shut down");
    }

    fn start_timer(self: &Arc<Self>) {
        let Some(interval) = self.update_interval else {
            return;
        };
        if self.shut_down.load(Ordering::SeqCst) {
            return;
        }

        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        // The ticker adds the period to its deadline on every tick
        let Some(start) = Instant::now()
            .checked_add(interval)
            .filter(|start| start.checked_add(interval).is_some())
        else {
            warn!(
                coordinator = %self.name,
                ?interval,
                "Update interval too long, periodic refresh disabled"
            );
            return;
        };

        let coordinator = Arc::downgrade(self);
        *timer = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(coordinator) = coordinator.upgrade() else {
                    break;
                };
                // Already logged and recorded by refresh()
                let _ = coordinator.refresh().await;
            }
        }));
        debug!(coordinator = %self.name, ?interval, "Scheduled periodic refresh");
    }

    fn stop_timer(&self) {
        if let Some(handle) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl<U: DataUpdate> Drop for DataUpdateCoordinator<U> {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

impl<U: DataUpdate> fmt::Debug for DataUpdateCoordinator<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUpdateCoordinator")
            .field("name", &self.name)
            .field("update_interval", &self.update_interval)
            .field("last_update_success", &self.last_update_success())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Displays an error followed by its sources
struct ErrorChain<'a>(&'a (dyn StdError + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}
