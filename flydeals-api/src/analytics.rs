use axum::{extract::State, routing::get, Json, Router};
use flydeals_core::models::Analytics;

use crate::error::AppError;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/analytics", get(get_analytics))
}

/// GET /admin/analytics
pub async fn get_analytics(State(state): State<AppState>) -> Result<Json<Analytics>, AppError> {
    Ok(Json(state.analytics.summary().await?))
}
