use axum::{extract::State, routing::{get, post}, Json, Router};
use flydeals_core::models::Subscriber;
use flydeals_shared::normalize_email;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/subscribe", post(subscribe).delete(unsubscribe))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/subscribers", get(list_subscribers))
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

impl SubscribeRequest {
    fn email(&self) -> Result<String, AppError> {
        normalize_email(&self.email).ok_or_else(|| AppError::Validation("A valid email is required".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriberListResponse {
    pub subscribers: Vec<Subscriber>,
    pub total: i64,
}

/// POST /subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    AppJson(req): AppJson<SubscribeRequest>,
) -> Result<Json<Value>, AppError> {
    let email = req.email()?;
    if state.subscribers.subscribe(&email).await? {
        tracing::info!("New newsletter subscriber");
    }
    Ok(Json(json!({ "message": "Subscribed successfully" })))
}

/// DELETE /subscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    AppJson(req): AppJson<SubscribeRequest>,
) -> Result<Json<Value>, AppError> {
    let email = req.email()?;
    if !state.subscribers.unsubscribe(&email).await? {
        return Err(AppError::NotFound("Email not found".to_string()));
    }
    Ok(Json(json!({ "message": "Unsubscribed successfully" })))
}

/// GET /admin/subscribers
pub async fn list_subscribers(State(state): State<AppState>) -> Result<Json<SubscriberListResponse>, AppError> {
    let subscribers = state.subscribers.list().await?;
    let total = subscribers.len() as i64;
    Ok(Json(SubscriberListResponse { subscribers, total }))
}
