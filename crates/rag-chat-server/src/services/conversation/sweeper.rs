use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::idempotency::IdempotencyCache;
use super::session_store::SessionContextStore;

/// Periodically reclaims expired sessions and idempotency entries.
/// Expiry is already enforced on read; this only frees memory.
pub struct StateSweeper {
    sessions: Arc<SessionContextStore>,
    idempotency: Arc<IdempotencyCache>,
    every: Duration,
}

impl StateSweeper {
    pub fn new(
        sessions: Arc<SessionContextStore>,
        idempotency: Arc<IdempotencyCache>,
        every: Duration,
    ) -> Self {
        Self {
            sessions,
            idempotency,
            every,
        }
    }

    /// Run one pass. Returns (sessions removed, idempotency entries removed)
    pub fn sweep(&self) -> (usize, usize) {
        let sessions = self.sessions.cleanup_expired();
        let tokens = self
            .idempotency
            .evict_older_than(self.idempotency.retention());

        debug!(
            "Sweep done: {} sessions, {} idempotency entries removed ({} / {} remain)",
            sessions,
            tokens,
            self.sessions.len(),
            self.idempotency.len()
        );
        (sessions, tokens)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        info!("State sweeper started (every {:?})", self.every);

        tokio::spawn(async move {
            let mut ticker = interval(self.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}
