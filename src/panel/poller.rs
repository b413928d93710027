use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::protocol::SvenState;
use crate::transport::ClientError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shorter intervals are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Last state seen by the client; overwritten wholesale on each fetch.
pub type StateCache = Arc<RwLock<Option<SvenState>>>;

pub fn empty_cache() -> StateCache {
    Arc::new(RwLock::new(None))
}

/// Background task fetching actuator state once on start and then once per
/// interval. Stopped explicitly or on drop.
#[derive(Debug)]
pub struct StatePoller {
    handle: Option<JoinHandle<()>>,
}

impl StatePoller {
    pub fn spawn<F, Fut>(fetch: F, interval: Duration, cache: StateCache) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<SvenState, ClientError>> + Send + 'static,
    {
        Self::spawn_with(fetch, interval, cache, |_| {})
    }

    /// Like [`StatePoller::spawn`], calling `on_update` after every successful fetch.
    pub fn spawn_with<F, Fut, C>(fetch: F, interval: Duration, cache: StateCache, on_update: C) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<SvenState, ClientError>> + Send + 'static,
        C: Fn(&SvenState) + Send + 'static,
    {
        let interval = if interval < MIN_POLL_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "poll interval too short, using {}ms",
                MIN_POLL_INTERVAL.as_millis()
            );
            MIN_POLL_INTERVAL
        } else {
            interval
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // first tick completes immediately
                ticker.tick().await;
                match fetch().await {
                    Ok(state) => {
                        {
                            let mut guard = cache.write().await;
                            *guard = Some(state);
                        }
                        debug!(height_mm = state.height_mm, position = ?state.position, "state refreshed");
                        on_update(&state);
                    }
                    Err(e) => {
                        warn!("failed to fetch Sven state: {}", e);
                    }
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for StatePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
