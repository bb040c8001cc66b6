//! Periodic presence sweep.
//!
//! The online flags expire on their own, but the presence sorted sets are
//! range-queried and must be pruned explicitly so stale members do not
//! linger for readers.

use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, warn};

use crate::presence::RedisPresenceTracker;

/// Default interval between sweeps, 5 minutes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Background job pruning stale presence entries.
pub struct PresenceSweeper {
    presence: RedisPresenceTracker,
    sweep_interval: Duration,
}

impl PresenceSweeper {
    /// Create a sweeper with the default interval.
    #[must_use]
    pub const fn new(presence: RedisPresenceTracker) -> Self {
        Self {
            presence,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Create a sweeper with a custom interval.
    #[must_use]
    pub const fn with_interval(presence: RedisPresenceTracker, sweep_interval: Duration) -> Self {
        Self {
            presence,
            sweep_interval,
        }
    }

    /// Spawn the sweep loop. Runs until the handle is aborted or the
    /// runtime shuts down.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.sweep_interval);
            // The first tick fires immediately; skip it so startup is quiet
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let cutoff = chrono::Utc::now().timestamp() - self.presence.ttl_secs();
                match self.presence.sweep_expired(cutoff).await {
                    Ok(removed) => {
                        if removed > 0 {
                            debug!(removed, "Presence sweep removed stale entries");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Presence sweep failed");
                    }
                }
            }
        })
    }
}
