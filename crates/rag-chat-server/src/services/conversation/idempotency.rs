use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::models::chat::ChatReply;

#[derive(Debug)]
struct StoredReply {
    reply: Arc<ChatReply>,
    stored_at: Instant,
}

/// One idempotency token. The cell is written at most once.
#[derive(Debug)]
struct Slot {
    created_at: Instant,
    cell: OnceCell<StoredReply>,
}

impl Slot {
    fn new(now: Instant) -> Self {
        Self {
            created_at: now,
            cell: OnceCell::new(),
        }
    }

    /// Age of the stored reply, or of the claim while the turn is still running
    fn age(&self, now: Instant) -> Duration {
        let since = self
            .cell
            .get()
            .map(|stored| stored.stored_at)
            .unwrap_or(self.created_at);
        now.saturating_duration_since(since)
    }
}

/// Replies keyed by client-supplied idempotency token (first writer wins).
pub struct IdempotencyCache {
    slots: DashMap<String, Arc<Slot>>,
    retention: Duration,
}

impl IdempotencyCache {
    pub fn new(retention: Duration) -> Self {
        info!("Initializing idempotency cache (retention: {:?})", retention);
        Self {
            slots: DashMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Cached reply for a token. None for empty, unknown, in-flight or expired tokens
    pub fn lookup(&self, token: &str) -> Option<Arc<ChatReply>> {
        self.lookup_at(token, Instant::now())
    }

    pub fn lookup_at(&self, token: &str, now: Instant) -> Option<Arc<ChatReply>> {
        if token.is_empty() {
            return None;
        }

        let slot = self.slots.get(token)?.clone();
        let stored = slot.cell.get()?;

        if slot.age(now) > self.retention {
            let retention = self.retention;
            self.slots
                .remove_if(token, |_, s| s.age(now) > retention);
            debug!("Idempotency token {} expired", token);
            return None;
        }

        Some(Arc::clone(&stored.reply))
    }

    /// Record the reply for a token. Returns false if a reply was already stored,
    /// in which case the existing one is kept.
    pub fn store(&self, token: &str, reply: ChatReply) -> bool {
        self.store_at(token, reply, Instant::now())
    }

    pub fn store_at(&self, token: &str, reply: ChatReply, now: Instant) -> bool {
        if token.is_empty() {
            return false;
        }

        let slot = self.claim(token, now);
        let written = slot
            .cell
            .set(StoredReply {
                reply: Arc::new(reply),
                stored_at: now,
            })
            .is_ok();

        if !written {
            debug!("Idempotency token {} already has a reply, keeping the first", token);
        }
        written
    }

    /// Return the reply for `token`, running `execute` only if no reply exists yet.
    ///
    /// Concurrent callers with the same token wait on the single running
    /// execution and all receive its reply. The map lock is released before
    /// `execute` runs. The boolean is true when this call ran `execute`.
    pub async fn get_or_execute<F, Fut>(&self, token: &str, execute: F) -> (Arc<ChatReply>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ChatReply>,
    {
        let slot = self.claim(token, Instant::now());
        let executed = AtomicBool::new(false);
        let executed_flag = &executed;

        let stored = slot
            .cell
            .get_or_init(|| async move {
                executed_flag.store(true, Ordering::Relaxed);
                let reply = execute().await;
                StoredReply {
                    reply: Arc::new(reply),
                    stored_at: Instant::now(),
                }
            })
            .await;

        (Arc::clone(&stored.reply), executed.load(Ordering::Relaxed))
    }

    /// Remove entries older than `max_age`. Returns number of entries removed
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        self.evict_older_than_at(max_age, Instant::now())
    }

    pub fn evict_older_than_at(&self, max_age: Duration, now: Instant) -> usize {
        let start_len = self.slots.len();
        self.slots.retain(|_, slot| slot.age(now) <= max_age);
        let count = start_len.saturating_sub(self.slots.len());

        if count > 0 {
            info!("Evicted {} idempotency entries older than {:?}", count, max_age);
        }

        count
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Get the slot for a token, replacing it if its reply outlived the retention window
    fn claim(&self, token: &str, now: Instant) -> Arc<Slot> {
        let mut entry = self
            .slots
            .entry(token.to_string())
            .or_insert_with(|| Arc::new(Slot::new(now)));

        if entry.age(now) > self.retention {
            *entry = Arc::new(Slot::new(now));
        }

        Arc::clone(entry.value())
    }
}
