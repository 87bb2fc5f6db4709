pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod progress;
pub mod session_store;
pub mod state;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::ServerConfig;
use state::{AppState, SharedGameStore};
use storage::MemoryStore;

/// Build the Axum router and application state from a config, backed by an
/// in-memory store.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    build_app_with_store(config, Arc::new(MemoryStore::new()))
}

/// Build the router over an explicit storage backend.
pub fn build_app_with_store(config: ServerConfig, store: SharedGameStore) -> (Router<()>, AppState) {
    let state = AppState::with_store(config, store);

    // Session routes (behind player auth)
    let session_routes = Router::new()
        .route("/start", post(api::start_game))
        .route("/kick", post(api::kick))
        .route("/end", post(api::end_game))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            player_auth_layer,
        ));

    // Read-only routes (unauthenticated)
    let public_routes = Router::new()
        .route("/ranking/global", get(api::global_ranking))
        .route("/ranking/weekly", get(api::weekly_ranking))
        .route("/phases", get(api::get_phases));

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/game", session_routes.merge(public_routes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    (app, state)
}

/// Background task that evicts sessions idle past the configured TTL.
pub fn spawn_session_reaper(state: AppState) {
    let ttl = Duration::from_secs(state.config.sessions.ttl_secs);
    let every = Duration::from_secs(state.config.sessions.reap_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = state.sessions.reap_expired(ttl).await;
            if evicted > 0 {
                tracing::info!(evicted, "Reaped idle sessions");
            }
        }
    });
}

/// Middleware wrapper that injects AuthConfig into request extensions for the
/// player auth middleware.
async fn player_auth_layer(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut request: axum::extract::Request,
    next: middleware::Next,
) -> Result<axum::response::Response, error::AppError> {
    request.extensions_mut().insert(state.auth.clone());
    auth::player_auth_middleware(request.headers().clone(), request, next).await
}
