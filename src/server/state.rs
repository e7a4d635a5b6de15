use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::RelayError;
use crate::location::SessionCache;
use crate::pipeline::Pipeline;

/// Idle time after which a session is forgotten.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
/// Most sessions held at once. The least recently used one is evicted first.
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            sessions: SessionRegistry::default(),
        }
    }

    /// Run one pipeline call against a session on the blocking pool.
    ///
    /// The session is checked out and mutated without holding the registry
    /// lock. It is written back only when the call succeeded and changed
    /// something; a failed call leaves the registry as it was. Concurrent
    /// calls on the same session id resolve last-write-wins.
    pub async fn run<T, F>(&self, session_id: &str, call: F) -> Result<T, RelayError>
    where
        T: Send + 'static,
        F: FnOnce(&Pipeline, &mut SessionCache) -> Result<T, RelayError> + Send + 'static,
    {
        let original = self.sessions.checkout(session_id);
        let mut session = original.clone();
        let pipeline = Arc::clone(&self.pipeline);

        let (session, result) = tokio::task::spawn_blocking(move || {
            let result = call(&pipeline, &mut session);
            (session, result)
        })
        .await
        .map_err(|e| RelayError::Internal(format!("pipeline worker failed: {}", e)))?;

        if result.is_ok() && session != original {
            self.sessions.store(session_id, session);
        }
        result
    }
}

struct SessionEntry {
    cache: SessionCache,
    touched: Instant,
    last_use: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    clock: u64,
}

impl Sessions {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// One [`SessionCache`] per session id, bounded by idle time and count.
pub struct SessionRegistry {
    sessions: Mutex<Sessions>,
    ttl: Duration,
    capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_SESSION_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Copy of the session's current cache (empty for unknown or expired ids).
    ///
    /// A live session counts as used, which refreshes its idle time.
    pub fn checkout(&self, id: &str) -> SessionCache {
        let now = Instant::now();
        let mut sessions = self.lock();
        let tick = sessions.tick();

        let expired = match sessions.entries.get_mut(id) {
            Some(entry) if now.saturating_duration_since(entry.touched) < self.ttl => {
                entry.touched = now;
                entry.last_use = tick;
                return entry.cache.clone();
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.entries.remove(id);
        }
        SessionCache::default()
    }

    /// Save a session, dropping expired ones and evicting the least
    /// recently used session when a new id would exceed capacity.
    pub fn store(&self, id: &str, session: SessionCache) {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut sessions = self.lock();

        let before = sessions.entries.len();
        sessions
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.touched) < ttl);
        let expired = before - sessions.entries.len();
        if expired > 0 {
            debug!(expired, "dropped idle sessions");
        }

        if !sessions.entries.contains_key(id) {
            while sessions.entries.len() >= self.capacity {
                let Some(oldest) = sessions
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_use)
                    .map(|(key, _)| key.clone())
                else {
                    break;
                };
                debug!(session = %oldest, "evicted least recently used session");
                sessions.entries.remove(&oldest);
            }
        }

        let last_use = sessions.tick();
        sessions.entries.insert(
            id.to_string(),
            SessionEntry {
                cache: session,
                touched: now,
                last_use,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        // A panic while holding the lock cannot leave a half-written map entry.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
