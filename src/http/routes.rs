//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::error;
use uuid::Uuid;

use crate::app::AppState;
use crate::http::middleware::{
    require_game_id, require_player_auth, throttle_actions, PlayerAuth,
};
use crate::maze::render::DEFAULT_SELF_COLOR;
use crate::poll::{SessionContext, ViewState};
use crate::upstream::{CreateGame, Direction, GameCommand, Registration, UpstreamError};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Leave room for the upstream request timeout to fire first
    let request_timeout =
        Duration::from_secs(state.config.upstream_timeout_secs.saturating_add(5));

    // Public routes (no player credential required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/game-create", post(create_game_handler))
        .route("/api/register", post(register_handler))
        .route("/api/game-start", get(game_start_handler))
        .route("/api/game-stop", get(game_stop_handler))
        .route("/api/game-reset", get(game_reset_handler))
        .route("/viewers", post(open_viewer_handler))
        .route(
            "/viewers/:viewer_id",
            get(viewer_state_handler).delete(close_viewer_handler),
        )
        .route("/viewers/:viewer_id/start", post(viewer_start_handler))
        .route("/viewers/:viewer_id/stop", post(viewer_stop_handler))
        .route("/viewers/:viewer_id/session", put(viewer_session_handler));

    // Player actions (credential required, throttled)
    let action_routes = Router::new()
        .route("/api/player-move", post(player_move_handler))
        .route("/api/player-shoot", post(player_shoot_handler))
        .route("/api/player-bomb", get(player_bomb_handler))
        .layer(middleware::from_fn_with_state(state.clone(), throttle_actions))
        .layer(middleware::from_fn(require_player_auth))
        .layer(middleware::from_fn(require_game_id));

    // Status polling (credential required, not throttled)
    let status_routes = Router::new()
        .route("/api/player-status", get(player_status_handler))
        .layer(middleware::from_fn(require_player_auth))
        .layer(middleware::from_fn(require_game_id));

    Router::new()
        .merge(public_routes)
        .merge(action_routes)
        .merge(status_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    viewers: usize,
    active_viewers: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        viewers: state.viewers.len(),
        active_viewers: state.viewers.active_count(),
    })
}

// ============================================================================
// Game endpoints
// ============================================================================

#[derive(Deserialize)]
struct GameQuery {
    #[serde(rename = "gameId")]
    game_id: Option<String>,
}

impl GameQuery {
    fn require(self) -> Result<String, AppError> {
        self.game_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing gameId".to_string()))
    }
}

/// Identifiers may arrive as JSON strings or numbers
fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn create_game_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateGame>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(game) =
        payload.map_err(|_| AppError::BadRequest("Invalid or missing fields".to_string()))?;

    Ok(Json(state.upstream.create_game(&game).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    game_id: Option<Value>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    styles: Option<Value>,
}

async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let missing = || AppError::BadRequest("Missing required fields".to_string());
    let Json(req) = payload.map_err(|_| missing())?;

    let game_id = identifier(req.game_id.as_ref()).ok_or_else(missing)?;
    let password = req.password.filter(|p| !p.is_empty()).ok_or_else(missing)?;
    let name = req.name.filter(|n| !n.is_empty()).ok_or_else(missing)?;

    let registration = Registration {
        name,
        styles: req.styles.unwrap_or_else(|| serde_json::json!({})),
    };

    Ok(Json(
        state
            .upstream
            .register_player(&game_id, &password, &registration)
            .await?,
    ))
}

async fn control_game(
    state: AppState,
    query: GameQuery,
    command: GameCommand,
) -> Result<Json<Value>, AppError> {
    let game_id = query.require()?;
    Ok(Json(state.upstream.control_game(&game_id, command).await?))
}

async fn game_start_handler(
    State(state): State<AppState>,
    Query(query): Query<GameQuery>,
) -> Result<Json<Value>, AppError> {
    control_game(state, query, GameCommand::Start).await
}

async fn game_stop_handler(
    State(state): State<AppState>,
    Query(query): Query<GameQuery>,
) -> Result<Json<Value>, AppError> {
    control_game(state, query, GameCommand::Stop).await
}

async fn game_reset_handler(
    State(state): State<AppState>,
    Query(query): Query<GameQuery>,
) -> Result<Json<Value>, AppError> {
    control_game(state, query, GameCommand::Reset).await
}

// ============================================================================
// Player endpoints
// ============================================================================

#[derive(Deserialize)]
struct DirectionRequest {
    #[serde(default)]
    direction: Option<Value>,
}

fn require_direction(
    payload: Result<Json<DirectionRequest>, JsonRejection>,
) -> Result<Direction, AppError> {
    let direction = payload
        .ok()
        .and_then(|Json(req)| req.direction)
        .filter(|d| !d.is_null())
        .ok_or_else(|| AppError::BadRequest("Missing direction".to_string()))?;

    serde_json::from_value(direction)
        .map_err(|_| AppError::BadRequest("Invalid direction".to_string()))
}

async fn player_move_handler(
    State(state): State<AppState>,
    Query(query): Query<GameQuery>,
    Extension(PlayerAuth(auth)): Extension<PlayerAuth>,
    payload: Result<Json<DirectionRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let game_id = query.require()?;
    let direction = require_direction(payload)?;

    Ok(Json(
        state.upstream.move_player(&game_id, &auth, direction).await?,
    ))
}

async fn player_shoot_handler(
    State(state): State<AppState>,
    Query(query): Query<GameQuery>,
    Extension(PlayerAuth(auth)): Extension<PlayerAuth>,
    payload: Result<Json<DirectionRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let game_id = query.require()?;
    let direction = require_direction(payload)?;

    Ok(Json(state.upstream.shoot(&game_id, &auth, direction).await?))
}

async fn player_bomb_handler(
    State(state): State<AppState>,
    Query(query): Query<GameQuery>,
    Extension(PlayerAuth(auth)): Extension<PlayerAuth>,
) -> Result<Json<Value>, AppError> {
    let game_id = query.require()?;
    Ok(Json(state.upstream.bomb(&game_id, &auth).await?))
}

async fn player_status_handler(
    State(state): State<AppState>,
    Query(query): Query<GameQuery>,
    Extension(PlayerAuth(auth)): Extension<PlayerAuth>,
) -> Result<Json<Value>, AppError> {
    let game_id = query.require()?;
    Ok(Json(state.upstream.player_status(&game_id, &auth).await?))
}

// ============================================================================
// Viewer endpoints
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest {
    #[serde(default)]
    game_id: Option<Value>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

impl SessionRequest {
    /// Token from the body, else from a bearer Authorization header
    fn into_session(
        self,
        bearer: Option<TypedHeader<Authorization<Bearer>>>,
    ) -> Result<SessionContext, AppError> {
        let game_id = identifier(self.game_id.as_ref()).unwrap_or_default();
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| bearer.map(|TypedHeader(auth)| auth.token().to_string()))
            .unwrap_or_default();
        let color = self
            .color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SELF_COLOR.to_string());

        let session = SessionContext::new(game_id, token).with_color(color);
        if !session.is_complete() {
            return Err(AppError::BadRequest("Missing gameId or token".to_string()));
        }
        Ok(session)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewerResponse {
    viewer_id: Uuid,
    active: bool,
}

async fn open_viewer_handler(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(req): Json<SessionRequest>,
) -> Result<(StatusCode, Json<ViewerResponse>), AppError> {
    let session = req.into_session(bearer)?;
    let viewer_id = state
        .viewers
        .open(session)
        .ok_or_else(|| AppError::BadRequest("Missing gameId or token".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(ViewerResponse {
            viewer_id,
            active: true,
        }),
    ))
}

fn viewer_not_found() -> AppError {
    AppError::NotFound("Viewer not found".to_string())
}

async fn viewer_state_handler(
    State(state): State<AppState>,
    Path(viewer_id): Path<Uuid>,
) -> Result<Json<ViewState>, AppError> {
    state
        .viewers
        .state(&viewer_id)
        .map(Json)
        .ok_or_else(viewer_not_found)
}

async fn viewer_start_handler(
    State(state): State<AppState>,
    Path(viewer_id): Path<Uuid>,
) -> Result<Json<ViewerResponse>, AppError> {
    let poll = state.viewers.get(&viewer_id).ok_or_else(viewer_not_found)?;
    poll.resume();

    Ok(Json(ViewerResponse {
        viewer_id,
        active: poll.is_active(),
    }))
}

async fn viewer_stop_handler(
    State(state): State<AppState>,
    Path(viewer_id): Path<Uuid>,
) -> Result<Json<ViewerResponse>, AppError> {
    let poll = state.viewers.get(&viewer_id).ok_or_else(viewer_not_found)?;
    poll.stop();

    Ok(Json(ViewerResponse {
        viewer_id,
        active: poll.is_active(),
    }))
}

async fn viewer_session_handler(
    State(state): State<AppState>,
    Path(viewer_id): Path<Uuid>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ViewerResponse>, AppError> {
    let poll = state.viewers.get(&viewer_id).ok_or_else(viewer_not_found)?;
    poll.update_session(req.into_session(bearer)?);

    Ok(Json(ViewerResponse {
        viewer_id,
        active: poll.is_active(),
    }))
}

async fn close_viewer_handler(
    State(state): State<AppState>,
    Path(viewer_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.viewers.close(&viewer_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(viewer_not_found())
    }
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream rejected request ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        details: Value,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Rejected {
                status,
                message,
                details,
            } => AppError::Upstream {
                status,
                message,
                details,
            },
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            AppError::Upstream {
                status,
                message,
                details,
            } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                serde_json::json!({ "error": message, "details": details }),
            ),
            AppError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
