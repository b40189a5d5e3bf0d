use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Admin, Analytics, Deal, Destination, NewDeal, NewPriceAlert, PriceAlert, Subscriber};
use crate::search::{DealFilter, Page, Pagination, SortOrder};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for deal data access
#[async_trait]
pub trait DealRepository: Send + Sync {
    /// Total and page rows are computed from the same filter.
    async fn search(
        &self,
        filter: &DealFilter,
        sort: SortOrder,
        pagination: Pagination,
    ) -> RepoResult<Page<Deal>>;

    async fn find_by_slug(&self, slug: &str, filter: &DealFilter) -> RepoResult<Option<Deal>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Deal>>;

    async fn slug_exists(&self, slug: &str) -> RepoResult<bool>;

    async fn insert(&self, deal: &NewDeal) -> RepoResult<Deal>;

    /// Persists every editable column of `deal`. `None` when the id is gone.
    async fn update(&self, deal: &Deal) -> RepoResult<Option<Deal>>;

    /// `false` when no row was deleted.
    async fn delete(&self, id: i64) -> RepoResult<bool>;

    /// Atomic `click_count + 1`. `false` when the slug is unknown.
    async fn increment_clicks(&self, slug: &str) -> RepoResult<bool>;

    /// Destination cities of deals visible at `now`, most deals first.
    async fn destinations(&self, now: DateTime<Utc>) -> RepoResult<Vec<Destination>>;
}

/// Repository trait for newsletter subscribers
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Idempotent. Returns `true` only when a new row was created.
    async fn subscribe(&self, email: &str) -> RepoResult<bool>;

    async fn unsubscribe(&self, email: &str) -> RepoResult<bool>;

    /// Newest first.
    async fn list(&self) -> RepoResult<Vec<Subscriber>>;
}

/// Repository trait for price alerts
#[async_trait]
pub trait PriceAlertRepository: Send + Sync {
    async fn insert(&self, alert: &NewPriceAlert) -> RepoResult<PriceAlert>;

    /// Newest first.
    async fn list_by_email(&self, email: &str) -> RepoResult<Vec<PriceAlert>>;

    async fn delete(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Admin>>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn summary(&self) -> RepoResult<Analytics>;
}
