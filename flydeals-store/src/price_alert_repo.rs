use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use flydeals_core::models::{NewPriceAlert, PriceAlert};
use flydeals_core::repository::{PriceAlertRepository, RepoResult};

use crate::database::repo_error;

const ALERT_COLUMNS: &str = "id, email, departure_city, destination_city, target_price, currency, created_at";

pub struct PgPriceAlertRepository {
    pool: PgPool,
}

impl PgPriceAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PriceAlertRow {
    id: i64,
    email: String,
    departure_city: String,
    destination_city: String,
    target_price: i32,
    currency: String,
    created_at: DateTime<Utc>,
}

impl From<PriceAlertRow> for PriceAlert {
    fn from(row: PriceAlertRow) -> Self {
        PriceAlert {
            id: row.id,
            email: row.email,
            departure_city: row.departure_city,
            destination_city: row.destination_city,
            target_price: row.target_price,
            currency: row.currency,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PriceAlertRepository for PgPriceAlertRepository {
    async fn insert(&self, alert: &NewPriceAlert) -> RepoResult<PriceAlert> {
        let sql = format!(
            r#"
            INSERT INTO price_alerts (email, departure_city, destination_city, target_price, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ALERT_COLUMNS
        );

        let row = sqlx::query_as::<_, PriceAlertRow>(&sql)
            .bind(&alert.email)
            .bind(&alert.departure_city)
            .bind(&alert.destination_city)
            .bind(alert.target_price)
            .bind(&alert.currency)
            .fetch_one(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(row.into())
    }

    async fn list_by_email(&self, email: &str) -> RepoResult<Vec<PriceAlert>> {
        let sql = format!(
            "SELECT {} FROM price_alerts WHERE email = $1 ORDER BY created_at DESC, id DESC",
            ALERT_COLUMNS
        );

        let rows = sqlx::query_as::<_, PriceAlertRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(rows.into_iter().map(PriceAlert::from).collect())
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM price_alerts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(result.rows_affected() > 0)
    }
}
