use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Storage Gate
// ============================================================================

/// Answers 503 for storage-backed routes until background init has finished.
pub async fn require_storage(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.readiness.is_ready() {
        tracing::debug!("Rejecting {} {}: storage not ready", req.method(), req.uri().path());
        return Err(AppError::Unavailable);
    }
    Ok(next.run(req).await)
}
