use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;

use ttybridge_terminal::{SessionError, SessionRegistry};

use crate::web::protocol::{
    ChatRequest, ChatResponse, CloseSessionRequest, CloseSessionResponse, HealthResponse,
    SessionListResponse,
};

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub default_timeout: Duration,
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/session", delete(close_session))
        .route("/sessions", get(list_sessions))
        .route("/health", get(health))
        .with_state(state)
}

/// POST /chat - one synchronous exchange against the session's CLI process
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".into()));
    }

    let timeout = req
        .timeout
        .map(|secs| Duration::from_secs_f64(secs.max(0.0)))
        .unwrap_or(state.default_timeout);

    let response = state.registry.send(&req.session_id, &req.message, timeout).await?;

    Ok(Json(ChatResponse {
        session_id: req.session_id,
        response,
    }))
}

/// DELETE /session - close a session; idempotent, always succeeds
async fn close_session(
    State(state): State<AppState>,
    Json(req): Json<CloseSessionRequest>,
) -> Json<CloseSessionResponse> {
    let closed = state.registry.close(&req.session_id).await;
    Json(CloseSessionResponse {
        session_id: req.session_id,
        closed,
    })
}

/// GET /sessions - snapshot of live sessions
async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.registry.list_sessions().await,
    })
}

/// GET /health - liveness and session count
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.registry.session_count().await,
    })
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Timeout(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::ExchangeTimeout { elapsed } => AppError::Timeout(format!(
                "no reply after {:.1}s",
                elapsed.as_secs_f64()
            )),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_timeout_maps_to_gateway_timeout() {
        let err: AppError = SessionError::ExchangeTimeout {
            elapsed: Duration::from_millis(2500),
        }
        .into();
        match err {
            AppError::Timeout(msg) => assert!(msg.contains("2.5")),
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[test]
    fn other_session_errors_map_to_internal() {
        let err: AppError = SessionError::Spawn("boom".into()).into();
        assert!(matches!(err, AppError::Internal(_)));

        let err: AppError = SessionError::ProcessDead("gone".into()).into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn error_responses_carry_status_codes() {
        let resp = AppError::BadRequest("empty".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Timeout("late".into()).into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

        let resp = AppError::Internal("broken".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
