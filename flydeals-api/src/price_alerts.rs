use axum::{extract::State, http::StatusCode, routing::{delete, post}, Json, Router};
use flydeals_core::models::{NewPriceAlert, PriceAlert, DEFAULT_CURRENCY};
use flydeals_shared::normalize_email;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/price-alerts", post(create_alert).get(list_alerts))
        .route("/price-alerts/{id}", delete(delete_alert))
}

#[derive(Debug, Deserialize)]
pub struct CreatePriceAlertRequest {
    #[serde(default)]
    pub email: String,
    pub departure_city: Option<String>,
    #[serde(default)]
    pub destination_city: String,
    #[serde(default)]
    pub target_price: i32,
    pub currency: Option<String>,
}

impl CreatePriceAlertRequest {
    fn into_new_alert(self) -> Result<NewPriceAlert, AppError> {
        let email = normalize_email(&self.email);
        let destination_city = self.destination_city.trim().to_string();

        let Some(email) = email.filter(|_| !destination_city.is_empty() && self.target_price > 0) else {
            return Err(AppError::Validation(
                "A valid email, destination_city, and a positive target_price are required".to_string(),
            ));
        };

        Ok(NewPriceAlert {
            email,
            departure_city: self.departure_city.map(|c| c.trim().to_string()).unwrap_or_default(),
            destination_city,
            target_price: self.target_price,
            currency: self
                .currency
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceAlertListResponse {
    pub alerts: Vec<PriceAlert>,
}

/// POST /price-alerts
pub async fn create_alert(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreatePriceAlertRequest>,
) -> Result<(StatusCode, Json<PriceAlert>), AppError> {
    let alert = state.price_alerts.insert(&req.into_new_alert()?).await?;
    tracing::info!("Price alert {} created for {}", alert.id, alert.destination_city);
    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /price-alerts?email=
pub async fn list_alerts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AlertQuery>,
) -> Result<Json<PriceAlertListResponse>, AppError> {
    let email = query
        .email
        .as_deref()
        .and_then(normalize_email)
        .ok_or_else(|| AppError::Validation("email query parameter is required".to_string()))?;

    let alerts = state.price_alerts.list_by_email(&email).await?;
    Ok(Json(PriceAlertListResponse { alerts }))
}

/// DELETE /price-alerts/{id}
pub async fn delete_alert(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    if !state.price_alerts.delete(id).await? {
        return Err(AppError::NotFound("Price alert not found".to_string()));
    }
    Ok(Json(json!({ "message": "Price alert deleted" })))
}
