use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use lanekick_core::session::{SessionId, SessionState};

/// One in-memory session plus its idle clock.
#[derive(Debug)]
pub struct SessionEntry {
    pub state: SessionState,
    last_touched: Instant,
}

impl SessionEntry {
    fn new(state: SessionState) -> Self {
        Self {
            state,
            last_touched: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_touched.elapsed()
    }
}

pub type SessionHandle = Arc<Mutex<SessionEntry>>;

/// Raised when starting a session would exceed `max_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    pub max_active: usize,
}

impl std::fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "too many active sessions (max {})", self.max_active)
    }
}

impl std::error::Error for CapacityExceeded {}

/// Authoritative live sessions keyed by id.
///
/// The map lock is only held to look up, insert or remove handles. Each
/// session has its own mutex, so actions on one session are serialized while
/// different sessions never contend.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    max_active: usize,
}

impl SessionStore {
    pub fn new(max_active: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_active,
        }
    }

    pub async fn insert(&self, state: SessionState) -> Result<SessionHandle, CapacityExceeded> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_active && !sessions.contains_key(&state.id) {
            return Err(CapacityExceeded {
                max_active: self.max_active,
            });
        }
        let id = state.id;
        let handle = Arc::new(Mutex::new(SessionEntry::new(state)));
        sessions.insert(id, Arc::clone(&handle));
        Ok(handle)
    }

    pub async fn get(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.write().await.remove(&id)
    }

    /// Run `f` with exclusive access to one session. Returns `None` if the
    /// session is not held in memory.
    pub async fn with_lock<F, R>(&self, id: SessionId, f: F) -> Option<R>
    where
        F: FnOnce(&mut SessionEntry) -> R,
    {
        let handle = self.get(id).await?;
        let mut entry = handle.lock().await;
        entry.touch();
        Some(f(&mut entry))
    }

    /// Evict sessions idle for at least `ttl`. Sessions currently locked are
    /// in use and are skipped. Returns the number evicted.
    pub async fn reap_expired(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, handle| match handle.try_lock() {
            Ok(entry) => {
                let expired = entry.idle_for() >= ttl;
                if expired {
                    tracing::info!(
                        session_id = %id,
                        player = %entry.state.player_id,
                        ended = entry.state.is_ended(),
                        "Evicting idle session"
                    );
                }
                !expired
            },
            Err(_) => true,
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
