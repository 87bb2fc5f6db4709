use std::sync::Arc;

use lanekick_core::phase::PhaseTable;

use crate::auth::AuthConfig;
use crate::config::ServerConfig;
use crate::progress::ProgressWriter;
use crate::session_store::SessionStore;
use crate::storage::{GameStore, MemoryStore};

pub type SharedSessionStore = Arc<SessionStore>;
pub type SharedGameStore = Arc<dyn GameStore>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SharedSessionStore,
    pub store: SharedGameStore,
    /// Off-path queue for the action log and running progress writes.
    pub progress: ProgressWriter,
    pub auth: AuthConfig,
    pub phases: Arc<PhaseTable>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// In-memory store. Spawns the progress writer, so call inside a runtime.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: ServerConfig, store: SharedGameStore) -> Self {
        let auth = AuthConfig {
            token_secret: config.auth.token_secret.clone(),
        };
        let phases = PhaseTable::load(config.phases_path.as_deref());
        Self {
            sessions: Arc::new(SessionStore::new(config.sessions.max_active)),
            progress: ProgressWriter::spawn(Arc::clone(&store)),
            store,
            auth,
            phases: Arc::new(phases),
            config: Arc::new(config),
        }
    }
}
