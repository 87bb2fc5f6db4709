use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use lanekick_core::player::PlayerId;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Longest player id accepted in a token.
pub const MAX_PLAYER_ID_LEN: usize = 128;

/// Authentication configuration.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// HMAC secret for player tokens. None = dev mode, the bearer value is
    /// the player id itself.
    pub token_secret: Option<String>,
}

/// Authenticated caller, inserted into request extensions by
/// [`player_auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity(pub PlayerId);

/// Issue a token of the form `<player>.<hex hmac-sha256(player)>`.
pub fn sign_player_token(secret: &str, player_id: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(player_id.as_bytes());
    format!("{player_id}.{}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a signed player token and return the player id it names.
pub fn verify_player_token(secret: &str, token: &str) -> Option<PlayerId> {
    let (player_id, hex_sig) = token.rsplit_once('.')?;
    if !valid_player_id(player_id) {
        return None;
    }
    let expected = hex::decode(hex_sig).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(player_id.as_bytes());
    mac.verify_slice(&expected).ok()?;
    Some(player_id.to_string())
}

fn valid_player_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_PLAYER_ID_LEN && !id.chars().any(char::is_whitespace)
}

/// Resolve a bearer value to a player under `config`.
pub fn resolve_player(config: &AuthConfig, token: &str) -> Option<PlayerId> {
    match config.token_secret {
        Some(ref secret) => verify_player_token(secret, token),
        None => valid_player_id(token).then(|| token.to_string()),
    }
}

/// Axum middleware that requires a bearer token naming a player and inserts
/// the resulting [`PlayerIdentity`] for handlers.
pub async fn player_auth_middleware(
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return Err(AppError::Unauthorized("missing bearer token".to_string()));
    };

    let Some(player_id) = resolve_player(&auth_config, token) else {
        tracing::warn!(path = %request.uri().path(), "Rejected invalid player token");
        return Err(AppError::Unauthorized("invalid bearer token".to_string()));
    };

    request.extensions_mut().insert(PlayerIdentity(player_id));
    Ok(next.run(request).await)
}
