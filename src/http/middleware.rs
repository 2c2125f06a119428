//! Player credential and action throttling middleware

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use crate::app::AppState;

/// Authorization header value as sent by the player, forwarded verbatim upstream
#[derive(Debug, Clone)]
pub struct PlayerAuth(pub String);

/// Rejections raised before a player request reaches its handler
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing gameId")]
    MissingGameId,

    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Too many actions, slow down")]
    RateLimited,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingGameId => StatusCode::BAD_REQUEST,
            AuthError::MissingHeader => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
struct GameIdParam {
    #[serde(rename = "gameId")]
    game_id: Option<String>,
}

/// Middleware rejecting player requests without a `gameId` query parameter.
///
/// Must run before [`require_player_auth`] so a missing game wins over a
/// missing credential.
pub async fn require_game_id(request: Request, next: Next) -> Result<Response, AuthError> {
    let present = Query::<GameIdParam>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(param)| param.game_id)
        .is_some_and(|id| !id.trim().is_empty());
    if !present {
        return Err(AuthError::MissingGameId);
    }

    Ok(next.run(request).await)
}

/// Middleware to require a player Authorization header
pub async fn require_player_auth(mut request: Request, next: Next) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::MissingHeader)?
        .to_string();

    // Insert into request extensions for handlers to access
    request.extensions_mut().insert(PlayerAuth(auth_header));

    Ok(next.run(request).await)
}

/// Middleware limiting player actions per credential.
///
/// Must run after [`require_player_auth`].
pub async fn throttle_actions(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Some(PlayerAuth(auth)) = request.extensions().get::<PlayerAuth>() {
        if !state.action_limiter.check(auth) {
            warn!(path = %request.uri().path(), "Rate limited player action");
            return Err(AuthError::RateLimited);
        }
    }

    Ok(next.run(request).await)
}
