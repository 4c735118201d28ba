use serde::{Deserialize, Serialize};
use ttybridge_terminal::SessionSummary;

fn default_session_id() -> String {
    "default".to_string()
}

/// POST /chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    pub message: String,
    /// Seconds to wait for a reply; the server default applies when omitted.
    #[serde(default)]
    pub timeout: Option<f64>,
}

/// POST /chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
}

/// DELETE /session request body
#[derive(Debug, Deserialize)]
pub struct CloseSessionRequest {
    pub session_id: String,
}

/// DELETE /session response body
#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub session_id: String,
    pub closed: bool,
}

/// GET /sessions response body
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// GET /health response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}
