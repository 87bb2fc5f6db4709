//! Write-behind queue for the per-action log and running progress snapshot.
//!
//! The kick path only enqueues; a single background task drains the queue
//! and runs each write on the blocking pool. Writes are applied in the order
//! they were queued, so a session's snapshots never land out of order.

use std::sync::Arc;

use tokio::sync::mpsc;

use lanekick_core::session::{ActionRecord, SessionId, SessionState};

use crate::state::SharedGameStore;
use crate::storage::{GameStore, StoreError};

/// One best-effort write queued by the kick path.
#[derive(Debug, Clone)]
pub enum ProgressWrite {
    Action(ActionRecord),
    Snapshot(Box<SessionState>),
}

impl ProgressWrite {
    fn session_id(&self) -> SessionId {
        match self {
            Self::Action(record) => record.session_id,
            Self::Snapshot(state) => state.id,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Action(_) => "Action log",
            Self::Snapshot(_) => "Progress",
        }
    }

    fn apply(&self, store: &dyn GameStore) -> Result<(), StoreError> {
        match self {
            Self::Action(record) => store.append_action(record),
            Self::Snapshot(state) => store.record_progress(state),
        }
    }
}

/// Handle to the background writer.
#[derive(Clone)]
pub struct ProgressWriter {
    tx: mpsc::UnboundedSender<ProgressWrite>,
}

impl ProgressWriter {
    /// Spawn the writer task over `store`. Must be called inside a Tokio
    /// runtime. The task stops once every handle is dropped.
    pub fn spawn(store: SharedGameStore) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressWrite>();
        tokio::spawn(async move {
            while let Some(write) = rx.recv().await {
                let id = write.session_id();
                let label = write.label();
                let store = Arc::clone(&store);
                match tokio::task::spawn_blocking(move || write.apply(store.as_ref())).await {
                    Ok(Ok(())) => {},
                    Ok(Err(e)) => {
                        tracing::warn!(session_id = %id, error = %e, "{label} write failed");
                    },
                    Err(e) => {
                        tracing::error!(session_id = %id, error = %e, "{label} write panicked");
                    },
                }
            }
            tracing::debug!("Progress queue closed, writer stopping");
        });
        Self { tx }
    }

    /// Queue a write. Never blocks.
    pub fn enqueue(&self, write: ProgressWrite) {
        if let Err(e) = self.tx.send(write) {
            tracing::warn!(session_id = %e.0.session_id(), "Progress writer stopped, write dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use lanekick_core::judgment::Judgment;
    use lanekick_core::test_helpers::{apply_kicks, make_session};

    use crate::storage::MemoryStore;

    async fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("queued writes never landed");
    }

    #[tokio::test]
    async fn writes_land_in_queue_order() {
        let store = Arc::new(MemoryStore::new());
        let writer = ProgressWriter::spawn(Arc::clone(&store) as SharedGameStore);

        let mut s = make_session("p1");
        store.create_session(&s).unwrap();
        let outcomes = apply_kicks(&mut s, &[Judgment::Hit, Judgment::Miss, Judgment::Perfect]);
        for out in outcomes {
            writer.enqueue(ProgressWrite::Action(out.record));
        }
        writer.enqueue(ProgressWrite::Snapshot(Box::new(s.clone())));

        wait_until(|| store.load_session(s.id).unwrap().unwrap().score == s.score).await;
        let judgments: Vec<_> = store.actions(s.id).iter().map(|a| a.judgment).collect();
        assert_eq!(judgments, [Judgment::Hit, Judgment::Miss, Judgment::Perfect]);
    }

    #[tokio::test]
    async fn later_snapshot_wins() {
        let store = Arc::new(MemoryStore::new());
        let writer = ProgressWriter::spawn(Arc::clone(&store) as SharedGameStore);

        let mut s = make_session("p1");
        store.create_session(&s).unwrap();
        apply_kicks(&mut s, &[Judgment::Hit]);
        writer.enqueue(ProgressWrite::Snapshot(Box::new(s.clone())));
        apply_kicks(&mut s, &[Judgment::Perfect]);
        writer.enqueue(ProgressWrite::Snapshot(Box::new(s.clone())));
        // Marker write; once it lands both snapshots have been applied.
        let marker = apply_kicks(&mut s.clone(), &[Judgment::Miss]).remove(0);
        writer.enqueue(ProgressWrite::Action(marker.record));

        wait_until(|| store.actions(s.id).len() == 1).await;
        assert_eq!(store.load_session(s.id).unwrap().unwrap().score, s.score);
    }
}
