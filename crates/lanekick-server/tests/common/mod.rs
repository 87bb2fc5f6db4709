use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use uuid::Uuid;

use lanekick_core::leaderboard::RankingEntry;
use lanekick_core::player::PlayerAggregate;
use lanekick_core::session::{ActionRecord, SessionId, SessionState};

use lanekick_server::build_app_with_store;
use lanekick_server::config::{AuthFileConfig, ServerConfig};
use lanekick_server::state::AppState;
use lanekick_server::storage::{Finalize, GameStore, MemoryStore, StoreError};

/// Store wrapper whose best-effort writes take `delay` each.
pub struct SlowStore {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
}

impl GameStore for SlowStore {
    fn create_session(&self, session: &SessionState) -> Result<(), StoreError> {
        self.inner.create_session(session)
    }

    fn load_session(&self, id: SessionId) -> Result<Option<SessionState>, StoreError> {
        self.inner.load_session(id)
    }

    fn record_progress(&self, session: &SessionState) -> Result<(), StoreError> {
        std::thread::sleep(self.delay);
        self.inner.record_progress(session)
    }

    fn append_action(&self, record: &ActionRecord) -> Result<(), StoreError> {
        std::thread::sleep(self.delay);
        self.inner.append_action(record)
    }

    fn finalize_session(
        &self,
        session: &SessionState,
        week_start: u64,
    ) -> Result<Finalize, StoreError> {
        self.inner.finalize_session(session, week_start)
    }

    fn player_aggregate(&self, player_id: &str) -> Result<Option<PlayerAggregate>, StoreError> {
        self.inner.player_aggregate(player_id)
    }

    fn global_ranking(&self, limit: usize) -> Result<Vec<RankingEntry>, StoreError> {
        self.inner.global_ranking(limit)
    }

    fn weekly_ranking(
        &self,
        week_start: u64,
        limit: usize,
    ) -> Result<Vec<RankingEntry>, StoreError> {
        self.inner.weekly_ranking(week_start, limit)
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server in dev auth mode (bearer value is the player id).
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    /// Start a test server that requires signed player tokens.
    pub async fn with_secret(secret: &str) -> Self {
        let config = ServerConfig {
            auth: AuthFileConfig {
                token_secret: Some(secret.to_string()),
            },
            ..ServerConfig::default()
        };
        Self::from_config(config).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::clone(&store) as Arc<dyn GameStore>;
        Self::with_backend(config, store, backend).await
    }

    /// Serve over `backend`; `store` is the memory store it ultimately writes to.
    pub async fn with_backend(
        config: ServerConfig,
        store: Arc<MemoryStore>,
        backend: Arc<dyn GameStore>,
    ) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, state) = build_app_with_store(config, backend);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            store,
            client: reqwest::Client::new(),
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }

    /// POST a JSON body as `player`, returning status and parsed body.
    pub async fn post_as(&self, player: &str, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(player)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Start a session for `player` and return its id.
    pub async fn start(&self, player: &str) -> String {
        let (status, body) = self.post_as(player, "/game/start", json!({})).await;
        assert_eq!(status, 200, "start failed: {body}");
        body["session_id"].as_str().unwrap().to_string()
    }

    pub async fn kick(&self, player: &str, session_id: &str, timing: &str) -> (u16, Value) {
        self.post_as(
            player,
            "/game/kick",
            json!({ "session_id": session_id, "timing": timing }),
        )
        .await
    }

    pub async fn end(&self, player: &str, session_id: &str) -> (u16, Value) {
        self.post_as(player, "/game/end", json!({ "session_id": session_id }))
            .await
    }

    /// Wait for the write-behind queue to log `count` actions for a session.
    pub async fn wait_for_actions(&self, session_id: &str, count: usize) -> Vec<ActionRecord> {
        let id = Uuid::parse_str(session_id).unwrap();
        for _ in 0..300 {
            let actions = self.store.actions(id);
            if actions.len() >= count {
                return actions;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} logged actions for {session_id}");
    }
}
