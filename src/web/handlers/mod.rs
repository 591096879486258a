pub mod export_handlers;
pub mod session_handlers;
pub mod system_handlers;

pub use export_handlers::*;
pub use session_handlers::*;
pub use system_handlers::*;

use rocket::serde::json::Json;
use tracing::warn;

use crate::web::services::{SessionStore, SharedSession};
use crate::web::types::StandardErrorResponse;

pub(crate) type ApiError = Json<StandardErrorResponse>;

pub(crate) fn api_error(
    error: impl Into<String>,
    code: &str,
    suggestions: &[&str],
    session_id: &str,
) -> ApiError {
    Json(StandardErrorResponse::new(
        error.into(),
        code.to_string(),
        suggestions.iter().map(|s| s.to_string()).collect(),
        Some(session_id.to_string()),
    ))
}

pub(crate) async fn find_session(store: &SessionStore, id: &str) -> Result<SharedSession, ApiError> {
    store.get(id).await.ok_or_else(|| {
        warn!("Unknown session {}", id);
        api_error(
            format!("Session not found: {}", id),
            "SESSION_NOT_FOUND",
            &["Create a new session with POST /api/sessions"],
            id,
        )
    })
}
