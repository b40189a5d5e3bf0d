use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use flydeals_core::models::{normalize_tags, Deal, Destination, NewDeal, DEFAULT_CURRENCY};
use flydeals_core::patch::{optional_timestamp, DealPatch};
use flydeals_core::search::{DealFilter, DealSearchParams, Pagination, SortOrder};
use flydeals_core::slug::{base_slug, unique_slug};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::AdminSession;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list_deals))
        .route("/deals/{slug}", get(get_deal))
        .route("/deals/{slug}/click", post(track_click))
        .route("/destinations", get(list_destinations))
}

/// Mounted under `/admin` behind the auth gate.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list_all_deals).post(create_deal))
        .route("/deals/{id}", get(get_deal_by_id).put(update_deal).delete(delete_deal))
}

// ============================================================================
// Response & Request Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct DealListResponse {
    pub items: Vec<Deal>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl DealListResponse {
    fn new(items: Vec<Deal>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DestinationsResponse {
    pub destinations: Vec<Destination>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDealRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub departure_city: String,
    #[serde(default)]
    pub destination_city: String,
    #[serde(default)]
    pub price: i32,
    pub currency: Option<String>,
    pub travel_dates: Option<String>,
    pub affiliate_url: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub original_price: Option<i32>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl CreateDealRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty()
            || self.departure_city.trim().is_empty()
            || self.destination_city.trim().is_empty()
            || self.price <= 0
        {
            return Err(AppError::Validation(
                "title, departure_city, destination_city, and a positive price are required".to_string(),
            ));
        }
        Ok(())
    }

    fn into_new_deal(self, slug: String, now: DateTime<Utc>) -> NewDeal {
        let currency = self
            .currency
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        NewDeal {
            title: self.title,
            slug,
            departure_city: self.departure_city,
            destination_city: self.destination_city,
            price: self.price,
            currency,
            travel_dates: self.travel_dates.unwrap_or_default(),
            affiliate_url: self.affiliate_url.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            published: self.published,
            original_price: self.original_price,
            expires_at: self.expires_at,
            scheduled_at: self.scheduled_at,
            tags: normalize_tags(self.tags.unwrap_or_default()),
            created_at: now,
        }
    }
}

fn deal_not_found() -> AppError {
    AppError::NotFound("Deal not found".to_string())
}

// ============================================================================
// Public Handlers
// ============================================================================

/// GET /deals
pub async fn list_deals(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<DealSearchParams>,
) -> Result<Json<DealListResponse>, AppError> {
    let filter = params.apply_to(DealFilter::visible_at(Utc::now()));
    let pagination = params.pagination();

    let page = state.deals.search(&filter, params.sort(), pagination).await?;

    Ok(Json(DealListResponse::new(page.items, page.total, pagination)))
}

/// GET /deals/{slug}
pub async fn get_deal(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<Deal>, AppError> {
    let deal = state
        .deals
        .find_by_slug(&slug, &DealFilter::visible_at(Utc::now()))
        .await?
        .ok_or_else(deal_not_found)?;

    Ok(Json(deal))
}

/// POST /deals/{slug}/click
pub async fn track_click(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    if !state.deals.increment_clicks(&slug).await? {
        return Err(deal_not_found());
    }
    Ok(Json(json!({ "message": "Click tracked" })))
}

/// GET /destinations
pub async fn list_destinations(State(state): State<AppState>) -> Result<Json<DestinationsResponse>, AppError> {
    let destinations = state.deals.destinations(Utc::now()).await?;
    Ok(Json(DestinationsResponse { destinations }))
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /admin/deals
pub async fn list_all_deals(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<DealListResponse>, AppError> {
    let pagination = Pagination::from_raw(params.page.as_deref(), params.limit.as_deref());
    let page = state
        .deals
        .search(&DealFilter::new(), SortOrder::Newest, pagination)
        .await?;

    Ok(Json(DealListResponse::new(page.items, page.total, pagination)))
}

/// GET /admin/deals/{id}
pub async fn get_deal_by_id(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Deal>, AppError> {
    let deal = state.deals.find_by_id(id).await?.ok_or_else(deal_not_found)?;
    Ok(Json(deal))
}

/// POST /admin/deals
pub async fn create_deal(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    AppJson(req): AppJson<CreateDealRequest>,
) -> Result<(StatusCode, Json<Deal>), AppError> {
    req.validate()?;

    let slug = unique_slug(state.deals.as_ref(), &base_slug(&req.title)).await?;
    let deal = state.deals.insert(&req.into_new_deal(slug, Utc::now())).await?;

    tracing::info!("Admin {} created deal {} ({})", session.admin_id, deal.id, deal.slug);
    Ok((StatusCode::CREATED, Json(deal)))
}

/// PUT /admin/deals/{id}
pub async fn update_deal(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    AppPath(id): AppPath<i64>,
    AppJson(patch): AppJson<DealPatch>,
) -> Result<Json<Deal>, AppError> {
    patch.validate()?;

    let mut deal = state.deals.find_by_id(id).await?.ok_or_else(deal_not_found)?;
    patch.apply(&mut deal, Utc::now());

    let updated = state.deals.update(&deal).await?.ok_or_else(deal_not_found)?;

    tracing::info!("Admin {} updated deal {}", session.admin_id, id);
    Ok(Json(updated))
}

/// DELETE /admin/deals/{id}
pub async fn delete_deal(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    if !state.deals.delete(id).await? {
        return Err(deal_not_found());
    }

    tracing::info!("Admin {} deleted deal {}", session.admin_id, id);
    Ok(Json(json!({ "message": "Deal deleted successfully" })))
}
