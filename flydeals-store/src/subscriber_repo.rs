use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use flydeals_core::models::Subscriber;
use flydeals_core::repository::{RepoResult, SubscriberRepository};

use crate::database::repo_error;

pub struct PgSubscriberRepository {
    pool: PgPool,
}

impl PgSubscriberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    email: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl SubscriberRepository for PgSubscriberRepository {
    async fn subscribe(&self, email: &str) -> RepoResult<bool> {
        let result = sqlx::query("INSERT INTO subscribers (email) VALUES ($1) ON CONFLICT (email) DO NOTHING")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn unsubscribe(&self, email: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM subscribers WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> RepoResult<Vec<Subscriber>> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            "SELECT id, email, created_at FROM subscribers ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(repo_error)?;

        Ok(rows
            .into_iter()
            .map(|row| Subscriber { id: row.id, email: row.email, created_at: row.created_at })
            .collect())
    }
}
