use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use flydeals_core::models::Admin;
use flydeals_core::repository::{AdminRepository, RepoResult};

use crate::database::repo_error;

pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash.into(),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, email, password_hash, created_at FROM admins WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(repo_error)?;

        Ok(row.map(Admin::from))
    }
}
