use std::time::Duration;

use axum::Extension;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use lanekick_core::leaderboard::{self, RankingEntry};
use lanekick_core::net::messages::{
    EndRequest, EndResponse, KickRequest, KickResponse, StartResponse,
};
use lanekick_core::phase::PhaseTable;
use lanekick_core::session::{SessionError, SessionId, SessionState};
use lanekick_core::time;

use crate::auth::PlayerIdentity;
use crate::error::AppError;
use crate::progress::ProgressWrite;
use crate::state::AppState;
use crate::storage::{Finalize, StoreError};

/// Longest archetype name accepted on a kick.
const MAX_ENEMY_TYPE_LEN: usize = 64;
/// Background finalize attempts after a failed flush at end.
pub const FINALIZE_RETRY_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles each attempt.
pub const FINALIZE_RETRY_BASE: Duration = Duration::from_millis(100);

fn parse_session_id(raw: &str) -> Result<SessionId, AppError> {
    if raw.is_empty() {
        return Err(AppError::BadRequest("session_id is required".to_string()));
    }
    Uuid::parse_str(raw)
        .map_err(|_| AppError::BadRequest("session_id is not a valid id".to_string()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// POST /game/start: open a session for the caller.
pub async fn start_game(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
) -> Result<Json<StartResponse>, AppError> {
    let session = SessionState::new(Uuid::new_v4(), player.clone(), time::now_secs());
    let id = session.id;

    state
        .sessions
        .insert(session.clone())
        .await
        .map_err(|e| {
            tracing::warn!(player = %player, "{e}");
            AppError::Conflict(e.to_string())
        })?;

    if let Err(e) = state.store.create_session(&session) {
        state.sessions.remove(id).await;
        return Err(e.into());
    }

    tracing::info!(session_id = %id, player = %player, "Session started");
    Ok(Json(StartResponse {
        session_id: id,
        phase: session.phase,
        phases: PhaseTable::clone(&state.phases),
    }))
}

/// POST /game/kick: apply one judged action to the caller's session.
pub async fn kick(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
    body: Result<Json<KickRequest>, JsonRejection>,
) -> Result<Json<KickResponse>, AppError> {
    let req = json_body(body)?;
    let id = parse_session_id(&req.session_id)?;
    if req
        .enemy_type
        .as_ref()
        .is_some_and(|t| t.len() > MAX_ENEMY_TYPE_LEN)
    {
        return Err(AppError::BadRequest(format!(
            "enemy_type exceeds {MAX_ENEMY_TYPE_LEN} chars"
        )));
    }

    let now = time::now_secs();
    let scoring = &state.config.scoring;
    let phases = state.phases.as_ref();
    let progress = &state.progress;

    // Queue the log and snapshot under the session lock so they land in
    // action order; the writes themselves run off this path.
    let result = state
        .sessions
        .with_lock(id, |entry| {
            entry.state.check_owner(&player)?;
            let outcome = entry.state.apply(
                req.kind,
                req.timing,
                req.enemy_type.clone(),
                scoring,
                phases,
                now,
            )?;
            progress.enqueue(ProgressWrite::Action(outcome.record.clone()));
            progress.enqueue(ProgressWrite::Snapshot(Box::new(entry.state.clone())));
            Ok::<_, SessionError>(outcome)
        })
        .await;

    match result {
        Some(Ok(outcome)) => {
            if outcome.phase_up {
                tracing::info!(session_id = %id, phase = outcome.phase, "Phase up");
            }
            Ok(Json(KickResponse::from(&outcome)))
        },
        Some(Err(SessionError::NotOwner)) => {
            tracing::warn!(session_id = %id, player = %player, "Kick on another player's session");
            Err(SessionError::NotOwner.into())
        },
        Some(Err(e)) => Err(e.into()),
        None => {
            // Not in memory. An ended row is a conflict, anything else is gone.
            match state.store.load_session(id) {
                Ok(Some(row)) if row.player_id != player => {
                    tracing::warn!(session_id = %id, player = %player, "Kick on another player's session");
                    Err(SessionError::NotOwner.into())
                },
                Ok(Some(row)) if row.is_ended() => Err(SessionError::Ended.into()),
                Ok(_) => {
                    tracing::warn!(session_id = %id, player = %player, "Kick for unknown or expired session");
                    Err(AppError::NotFound(format!("session {id} not found")))
                },
                Err(e) => Err(e.into()),
            }
        },
    }
}

/// Best guess at the record flag, used only when the finalize that decides
/// it authoritatively has failed and is being retried.
fn estimate_new_record(state: &AppState, player: &str, score: u64) -> bool {
    match state.store.player_aggregate(player) {
        Ok(Some(agg)) => agg.is_new_record(score),
        Ok(None) => score > 0,
        Err(e) => {
            tracing::warn!(player = %player, error = %e, "Could not read player aggregate");
            false
        },
    }
}

fn finalize(state: &AppState, session: &SessionState) -> Result<Finalize, StoreError> {
    let ended_at = session.ended_at.unwrap_or(session.started_at);
    state
        .store
        .finalize_session(session, time::week_start(ended_at))
}

/// Retry a failed finalize in the background. The in-memory entry, if any,
/// is released once a retry lands.
pub fn spawn_finalize_retry(state: AppState, session: SessionState) {
    tokio::spawn(async move {
        let id = session.id;
        let mut delay = FINALIZE_RETRY_BASE;
        for attempt in 1..=FINALIZE_RETRY_ATTEMPTS {
            tokio::time::sleep(delay).await;
            match finalize(&state, &session) {
                Ok(_) => {
                    state.sessions.remove(id).await;
                    tracing::info!(session_id = %id, attempt, "Session finalized on retry");
                    return;
                },
                Err(e) => {
                    tracing::warn!(session_id = %id, attempt, error = %e, "Finalize retry failed");
                },
            }
            delay *= 2;
        }
        tracing::error!(
            session_id = %id,
            player = %session.player_id,
            score = session.score,
            "Giving up on session finalize, result not persisted"
        );
    });
}

/// POST /game/end: finalize the caller's session. Repeated or unknown ends
/// are no-ops.
pub async fn end_game(
    State(state): State<AppState>,
    Extension(PlayerIdentity(player)): Extension<PlayerIdentity>,
    body: Result<Json<EndRequest>, JsonRejection>,
) -> Result<Json<EndResponse>, AppError> {
    let req = json_body(body)?;
    let id = parse_session_id(req.session_id.as_deref().unwrap_or_default())?;
    let now = time::now_secs();

    if let Some(handle) = state.sessions.get(id).await {
        let mut entry = handle.lock().await;
        if entry.state.check_owner(&player).is_err() {
            tracing::warn!(session_id = %id, player = %player, "End on another player's session");
            return Err(SessionError::NotOwner.into());
        }
        if entry.state.is_ended() {
            tracing::debug!(session_id = %id, "End on session awaiting flush, no-op");
            return Ok(Json(EndResponse::from_summary(&entry.state.summary(), true)));
        }

        let mut summary = entry.state.end(now)?;
        entry.touch();

        return match finalize(&state, &entry.state) {
            Ok(Finalize::Applied { new_record }) => {
                summary.new_record = new_record;
                state.sessions.remove(id).await;
                tracing::info!(
                    session_id = %id,
                    player = %player,
                    score = summary.final_score,
                    phase = summary.phase_reached,
                    "Session ended"
                );
                Ok(Json(EndResponse::from_summary(&summary, false)))
            },
            Ok(Finalize::AlreadyEnded(row)) => {
                state.sessions.remove(id).await;
                Ok(Json(EndResponse::from_summary(&row.summary(), true)))
            },
            Err(e) => {
                tracing::error!(session_id = %id, player = %player, error = %e, "Session finalize failed, retrying");
                entry.state.new_record = estimate_new_record(&state, &player, summary.final_score);
                summary.new_record = entry.state.new_record;
                spawn_finalize_retry(state.clone(), entry.state.clone());
                Ok(Json(EndResponse::from_summary(&summary, false)))
            },
        };
    }

    let Some(mut row) = state.store.load_session(id)? else {
        tracing::info!(session_id = %id, player = %player, "End for unknown session, echoing client stats");
        return Ok(Json(EndResponse::echo(&req.reported)));
    };
    if row.check_owner(&player).is_err() {
        tracing::warn!(session_id = %id, player = %player, "End on another player's session");
        return Err(SessionError::NotOwner.into());
    }
    if row.is_ended() {
        return Ok(Json(EndResponse::from_summary(&row.summary(), true)));
    }

    // The live copy is gone (expired or restarted); fall back to the
    // client's tally on top of the last persisted progress.
    let mut summary = row.end_with_reported(&req.reported, &state.phases, now)?;
    tracing::warn!(
        session_id = %id,
        player = %player,
        score = summary.final_score,
        "Finalizing expired session from client-reported stats"
    );

    match finalize(&state, &row) {
        Ok(Finalize::Applied { new_record }) => {
            summary.new_record = new_record;
            Ok(Json(EndResponse::from_summary(&summary, false)))
        },
        Ok(Finalize::AlreadyEnded(stored)) => {
            Ok(Json(EndResponse::from_summary(&stored.summary(), true)))
        },
        Err(e) => {
            tracing::error!(session_id = %id, player = %player, error = %e, "Session finalize failed, retrying");
            summary.new_record = estimate_new_record(&state, &player, summary.final_score);
            spawn_finalize_retry(state.clone(), row);
            Ok(Json(EndResponse::from_summary(&summary, false)))
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<usize>,
}

fn ranking_limit(state: &AppState, query: &RankingQuery) -> usize {
    let ranking = &state.config.ranking;
    leaderboard::clamp_limit(query.limit, ranking.default_limit, ranking.max_limit)
}

/// GET /game/ranking/global: lifetime totals, descending.
pub async fn global_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<RankingEntry>>, AppError> {
    let limit = ranking_limit(&state, &query);
    Ok(Json(state.store.global_ranking(limit)?))
}

/// GET /game/ranking/weekly: current week's accumulators, descending.
pub async fn weekly_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<RankingEntry>>, AppError> {
    let limit = ranking_limit(&state, &query);
    let week = time::week_start(time::now_secs());
    Ok(Json(state.store.weekly_ranking(week, limit)?))
}

/// GET /game/phases: the static phase table.
pub async fn get_phases(State(state): State<AppState>) -> Json<PhaseTable> {
    Json(PhaseTable::clone(&state.phases))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_parsing() {
        assert!(matches!(parse_session_id(""), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_session_id("nope"), Err(AppError::BadRequest(_))));
        let id = Uuid::new_v4();
        assert_eq!(parse_session_id(&id.to_string()).unwrap(), id);
    }

    #[tokio::test]
    async fn ranking_limit_clamps_to_config() {
        let state = AppState::new(crate::config::ServerConfig::default());
        assert_eq!(ranking_limit(&state, &RankingQuery { limit: None }), 100);
        assert_eq!(ranking_limit(&state, &RankingQuery { limit: Some(3) }), 3);
        assert_eq!(
            ranking_limit(&state, &RankingQuery { limit: Some(9_999) }),
            500
        );
    }
}
