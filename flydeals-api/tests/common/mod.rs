#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use flydeals_api::{
    app,
    credentials::{hash_password, CredentialVerifier},
    session::SessionCodec,
    state::{AppState, CookiePolicy, Readiness},
};
use flydeals_core::models::{
    Admin, Analytics, Deal, Destination, NewDeal, NewPriceAlert, PriceAlert, Subscriber, TopDeal,
};
use flydeals_core::repository::{
    AdminRepository, AnalyticsRepository, DealRepository, PriceAlertRepository, RepoError, RepoResult,
    SubscriberRepository,
};
use flydeals_core::search::{DealFilter, Page, Pagination, SortOrder};
use flydeals_shared::Masked;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";
pub const ADMIN_ID: i64 = 1;
pub const ADMIN_EMAIL: &str = "admin@flydeals.com";
pub const ADMIN_PASSWORD: &str = "correct-horse";
const BCRYPT_COST: u32 = 4;

// ============================================================================
// In-memory Repositories
// ============================================================================

#[derive(Default)]
struct DealTable {
    rows: Vec<Deal>,
    next_id: i64,
}

/// Mirrors the Postgres repository on top of the shared filter model.
#[derive(Default)]
pub struct InMemoryDeals {
    table: Mutex<DealTable>,
}

impl InMemoryDeals {
    pub fn get(&self, id: i64) -> Option<Deal> {
        self.table.lock().unwrap().rows.iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap().rows.len()
    }

    fn all(&self) -> Vec<Deal> {
        self.table.lock().unwrap().rows.clone()
    }
}

#[async_trait]
impl DealRepository for InMemoryDeals {
    async fn search(&self, filter: &DealFilter, sort: SortOrder, pagination: Pagination) -> RepoResult<Page<Deal>> {
        let mut matching: Vec<Deal> = self.all().into_iter().filter(|d| filter.matches(d)).collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn find_by_slug(&self, slug: &str, filter: &DealFilter) -> RepoResult<Option<Deal>> {
        Ok(self.all().into_iter().find(|d| d.slug == slug && filter.matches(d)))
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Deal>> {
        Ok(self.get(id))
    }

    async fn slug_exists(&self, slug: &str) -> RepoResult<bool> {
        Ok(self.table.lock().unwrap().rows.iter().any(|d| d.slug == slug))
    }

    async fn insert(&self, deal: &NewDeal) -> RepoResult<Deal> {
        let mut table = self.table.lock().unwrap();
        if table.rows.iter().any(|d| d.slug == deal.slug) {
            return Err(RepoError::Conflict("deals_slug_key".to_string()));
        }
        table.next_id += 1;
        let row = Deal {
            id: table.next_id,
            title: deal.title.clone(),
            slug: deal.slug.clone(),
            departure_city: deal.departure_city.clone(),
            destination_city: deal.destination_city.clone(),
            price: deal.price,
            currency: deal.currency.clone(),
            travel_dates: deal.travel_dates.clone(),
            affiliate_url: deal.affiliate_url.clone(),
            content: deal.content.clone(),
            image_url: deal.image_url.clone(),
            published: deal.published,
            original_price: deal.original_price,
            expires_at: deal.expires_at,
            scheduled_at: deal.scheduled_at,
            click_count: 0,
            tags: deal.tags.clone(),
            created_at: deal.created_at,
            updated_at: deal.created_at,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, deal: &Deal) -> RepoResult<Option<Deal>> {
        let mut table = self.table.lock().unwrap();
        if table.rows.iter().any(|d| d.slug == deal.slug && d.id != deal.id) {
            return Err(RepoError::Conflict("deals_slug_key".to_string()));
        }
        let Some(row) = table.rows.iter_mut().find(|d| d.id == deal.id) else {
            return Ok(None);
        };
        let click_count = row.click_count;
        *row = Deal { click_count, ..deal.clone() };
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut table = self.table.lock().unwrap();
        let before = table.rows.len();
        table.rows.retain(|d| d.id != id);
        Ok(table.rows.len() != before)
    }

    async fn increment_clicks(&self, slug: &str) -> RepoResult<bool> {
        let mut table = self.table.lock().unwrap();
        match table.rows.iter_mut().find(|d| d.slug == slug) {
            Some(row) => {
                row.click_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn destinations(&self, now: DateTime<Utc>) -> RepoResult<Vec<Destination>> {
        let visible = DealFilter::visible_at(now);
        let mut counts: HashMap<String, i64> = HashMap::new();
        for deal in self.all().iter().filter(|d| visible.matches(d)) {
            *counts.entry(deal.destination_city.clone()).or_default() += 1;
        }
        let mut destinations: Vec<Destination> = counts
            .into_iter()
            .map(|(city, deal_count)| Destination { city, deal_count })
            .collect();
        destinations.sort_by(|a, b| b.deal_count.cmp(&a.deal_count).then_with(|| a.city.cmp(&b.city)));
        Ok(destinations)
    }
}

#[derive(Default)]
pub struct InMemorySubscribers {
    rows: Mutex<Vec<Subscriber>>,
}

impl InMemorySubscribers {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriberRepository for InMemorySubscribers {
    async fn subscribe(&self, email: &str) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|s| s.email == email) {
            return Ok(false);
        }
        let id = rows.len() as i64 + 1;
        rows.push(Subscriber {
            id,
            email: email.to_string(),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn unsubscribe(&self, email: &str) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|s| s.email != email);
        Ok(rows.len() != before)
    }

    async fn list(&self) -> RepoResult<Vec<Subscriber>> {
        Ok(self.rows.lock().unwrap().iter().rev().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryPriceAlerts {
    rows: Mutex<Vec<PriceAlert>>,
}

#[async_trait]
impl PriceAlertRepository for InMemoryPriceAlerts {
    async fn insert(&self, alert: &NewPriceAlert) -> RepoResult<PriceAlert> {
        let mut rows = self.rows.lock().unwrap();
        let row = PriceAlert {
            id: rows.iter().map(|a| a.id).max().unwrap_or(0) + 1,
            email: alert.email.clone(),
            departure_city: alert.departure_city.clone(),
            destination_city: alert.destination_city.clone(),
            target_price: alert.target_price,
            currency: alert.currency.clone(),
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list_by_email(&self, email: &str) -> RepoResult<Vec<PriceAlert>> {
        Ok(self.rows.lock().unwrap().iter().rev().filter(|a| a.email == email).cloned().collect())
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() != before)
    }
}

pub struct InMemoryAdmins {
    rows: Vec<Admin>,
}

#[async_trait]
impl AdminRepository for InMemoryAdmins {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Admin>> {
        Ok(self.rows.iter().find(|a| a.email.eq_ignore_ascii_case(email)).cloned())
    }
}

pub struct InMemoryAnalytics {
    deals: Arc<InMemoryDeals>,
    subscribers: Arc<InMemorySubscribers>,
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalytics {
    async fn summary(&self) -> RepoResult<Analytics> {
        let deals = self.deals.all();
        let mut top: Vec<&Deal> = deals.iter().filter(|d| d.click_count > 0).collect();
        top.sort_by(|a, b| b.click_count.cmp(&a.click_count));

        Ok(Analytics {
            total_deals: deals.len() as i64,
            published_deals: deals.iter().filter(|d| d.published).count() as i64,
            total_clicks: deals.iter().map(|d| d.click_count as i64).sum(),
            subscribers: self.subscribers.len() as i64,
            top_deals: top
                .into_iter()
                .take(10)
                .map(|d| TopDeal {
                    id: d.id,
                    title: d.title.clone(),
                    click_count: d.click_count,
                })
                .collect(),
        })
    }
}

// ============================================================================
// Test Application
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub deals: Arc<InMemoryDeals>,
    pub subscribers: Arc<InMemorySubscribers>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let app = Self::starting();
        app.state.readiness.mark_ready();
        app
    }

    /// Storage not initialised yet.
    pub fn starting() -> Self {
        let deals = Arc::new(InMemoryDeals::default());
        let subscribers = Arc::new(InMemorySubscribers::default());
        let admin = Admin {
            id: ADMIN_ID,
            email: ADMIN_EMAIL.to_string(),
            password_hash: Masked(hash_password(ADMIN_PASSWORD, BCRYPT_COST).unwrap()),
            created_at: Utc::now(),
        };

        let state = AppState {
            deals: deals.clone(),
            subscribers: subscribers.clone(),
            price_alerts: Arc::new(InMemoryPriceAlerts::default()),
            admins: Arc::new(InMemoryAdmins { rows: vec![admin] }),
            analytics: Arc::new(InMemoryAnalytics {
                deals: deals.clone(),
                subscribers: subscribers.clone(),
            }),
            sessions: SessionCodec::new(SECRET, Duration::hours(72)),
            credentials: CredentialVerifier::new(BCRYPT_COST).unwrap(),
            cookies: CookiePolicy::default(),
            readiness: Readiness::new(),
        };

        Self {
            router: app(state.clone()),
            state,
            deals,
            subscribers,
        }
    }

    pub fn admin_token(&self) -> String {
        self.state.sessions.issue(ADMIN_ID, ADMIN_EMAIL).unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(request(Method::GET, uri, None, None)).await
    }

    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let token = self.admin_token();
        self.send(request(method, uri, body, Some(&token))).await
    }

    /// Inserts a deal straight into the repository.
    pub async fn seed(&self, deal: NewDeal) -> Deal {
        self.deals.insert(&deal).await.unwrap()
    }
}

pub fn request(method: Method, uri: &str, body: Option<Value>, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// A live deal; adjust fields on the returned value before seeding.
pub fn new_deal(title: &str, price: i32, created_at: DateTime<Utc>) -> NewDeal {
    NewDeal {
        title: title.to_string(),
        slug: flydeals_core::slug::base_slug(title),
        departure_city: "Berlin".to_string(),
        destination_city: "Lisbon".to_string(),
        price,
        currency: "EUR".to_string(),
        travel_dates: "May".to_string(),
        affiliate_url: "https://partner.example/deal".to_string(),
        content: String::new(),
        image_url: String::new(),
        published: true,
        original_price: None,
        expires_at: None,
        scheduled_at: None,
        tags: Vec::new(),
        created_at,
    }
}
