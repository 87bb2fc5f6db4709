//! Durable-storage contract and the in-memory implementation used by default
//! and in tests.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use lanekick_core::leaderboard::{self, RankingEntry, WeeklyScore};
use lanekick_core::player::{PlayerAggregate, PlayerId};
use lanekick_core::session::{ActionRecord, SessionId, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached or refused the write.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(m) => write!(f, "store unavailable: {m}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Result of finalizing a session row.
#[derive(Debug, Clone, PartialEq)]
pub enum Finalize {
    /// Row marked ended; player aggregate and weekly bucket credited.
    /// `new_record` is judged against the aggregate as it stood at that
    /// moment, so only one of several racing ends can claim a record.
    Applied { new_record: bool },
    /// Row was already ended. Nothing was credited; the stored row is returned.
    AlreadyEnded(Box<SessionState>),
}

/// Storage collaborator. Implementations must make `finalize_session`
/// atomic: marking the row ended and crediting the player happen together or
/// not at all, so a retried or repeated finalize can never double-credit.
pub trait GameStore: Send + Sync {
    fn create_session(&self, session: &SessionState) -> Result<(), StoreError>;

    fn load_session(&self, id: SessionId) -> Result<Option<SessionState>, StoreError>;

    /// Best-effort running snapshot of a live session. Ignored for rows that
    /// are already ended.
    fn record_progress(&self, session: &SessionState) -> Result<(), StoreError>;

    fn append_action(&self, record: &ActionRecord) -> Result<(), StoreError>;

    /// Mark the row ended with the given final state, merge it into the
    /// player's lifetime aggregate and add it to the `week_start` bucket.
    /// The stored row's `new_record` flag is decided here.
    fn finalize_session(
        &self,
        session: &SessionState,
        week_start: u64,
    ) -> Result<Finalize, StoreError>;

    fn player_aggregate(&self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError>;

    fn global_ranking(&self, limit: usize) -> Result<Vec<RankingEntry>, StoreError>;

    fn weekly_ranking(&self, week_start: u64, limit: usize)
    -> Result<Vec<RankingEntry>, StoreError>;
}

#[derive(Default)]
struct Tables {
    sessions: HashMap<SessionId, SessionState>,
    actions: HashMap<SessionId, Vec<ActionRecord>>,
    players: HashMap<PlayerId, PlayerAggregate>,
    weekly: HashMap<(PlayerId, u64), WeeklyScore>,
}

/// Process-local store. Everything lives behind one lock so finalization is
/// atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_finalize: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` finalize calls fail.
    pub fn fail_next_finalizes(&self, count: u32) {
        self.fail_finalize.store(count, Ordering::SeqCst);
    }

    /// Every action recorded for a session, in arrival order.
    pub fn actions(&self, id: SessionId) -> Vec<ActionRecord> {
        self.tables
            .read()
            .map(|t| t.actions.get(&id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn weekly_score(&self, player_id: &str, week_start: u64) -> Option<WeeklyScore> {
        let tables = self.tables.read().ok()?;
        tables
            .weekly
            .get(&(player_id.to_string(), week_start))
            .cloned()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_finalize
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl GameStore for MemoryStore {
    fn create_session(&self, session: &SessionState) -> Result<(), StoreError> {
        self.write()?.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn load_session(&self, id: SessionId) -> Result<Option<SessionState>, StoreError> {
        Ok(self.read()?.sessions.get(&id).cloned())
    }

    fn record_progress(&self, session: &SessionState) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if let Some(row) = tables.sessions.get_mut(&session.id)
            && !row.is_ended()
            && !session.is_ended()
        {
            *row = session.clone();
        }
        Ok(())
    }

    fn append_action(&self, record: &ActionRecord) -> Result<(), StoreError> {
        self.write()?
            .actions
            .entry(record.session_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn finalize_session(
        &self,
        session: &SessionState,
        week_start: u64,
    ) -> Result<Finalize, StoreError> {
        if self.take_injected_failure() {
            return Err(StoreError::Unavailable("injected finalize failure".to_string()));
        }
        let mut tables = self.write()?;
        if let Some(row) = tables.sessions.get(&session.id)
            && row.is_ended()
        {
            return Ok(Finalize::AlreadyEnded(Box::new(row.clone())));
        }

        let new_record = tables
            .players
            .get(&session.player_id)
            .map_or(session.score > 0, |agg| agg.is_new_record(session.score));
        let mut row = session.clone();
        row.new_record = new_record;
        let summary = row.summary();
        tables.sessions.insert(row.id, row);
        tables
            .players
            .entry(session.player_id.clone())
            .or_insert_with(|| PlayerAggregate::new(session.player_id.clone()))
            .merge_session(&summary);
        tables
            .weekly
            .entry((session.player_id.clone(), week_start))
            .or_insert_with(|| WeeklyScore::new(session.player_id.clone(), week_start))
            .accumulate(summary.final_score);
        Ok(Finalize::Applied { new_record })
    }

    fn player_aggregate(&self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        Ok(self.read()?.players.get(player_id).cloned())
    }

    fn global_ranking(&self, limit: usize) -> Result<Vec<RankingEntry>, StoreError> {
        let tables = self.read()?;
        Ok(leaderboard::rank_global(tables.players.values(), limit))
    }

    fn weekly_ranking(
        &self,
        week_start: u64,
        limit: usize,
    ) -> Result<Vec<RankingEntry>, StoreError> {
        let tables = self.read()?;
        Ok(leaderboard::rank_weekly(
            tables.weekly.values(),
            &tables.players,
            week_start,
            limit,
        ))
    }
}
