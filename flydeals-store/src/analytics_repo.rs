use async_trait::async_trait;
use sqlx::PgPool;

use flydeals_core::models::{Analytics, TopDeal};
use flydeals_core::repository::{AnalyticsRepository, RepoResult};

use crate::database::repo_error;

const TOP_DEALS_LIMIT: i64 = 10;

pub struct PgAnalyticsRepository {
    pool: PgPool,
}

impl PgAnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn scalar(&self, sql: &str) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(repo_error)
    }
}

#[derive(sqlx::FromRow)]
struct TopDealRow {
    id: i64,
    title: String,
    click_count: i32,
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn summary(&self) -> RepoResult<Analytics> {
        let total_deals = self.scalar("SELECT COUNT(*) FROM deals").await?;
        let published_deals = self.scalar("SELECT COUNT(*) FROM deals WHERE published = true").await?;
        // SUM over zero rows is NULL
        let total_clicks = self.scalar("SELECT COALESCE(SUM(click_count), 0)::BIGINT FROM deals").await?;
        let subscribers = self.scalar("SELECT COUNT(*) FROM subscribers").await?;

        let rows = sqlx::query_as::<_, TopDealRow>(
            "SELECT id, title, click_count FROM deals WHERE click_count > 0 ORDER BY click_count DESC LIMIT $1",
        )
        .bind(TOP_DEALS_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(repo_error)?;

        Ok(Analytics {
            total_deals,
            published_deals,
            total_clicks,
            subscribers,
            top_deals: rows
                .into_iter()
                .map(|row| TopDeal { id: row.id, title: row.title, click_count: row.click_count })
                .collect(),
        })
    }
}
