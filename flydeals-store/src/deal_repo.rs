use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use flydeals_core::models::{Deal, Destination, NewDeal};
use flydeals_core::repository::{DealRepository, RepoResult};
use flydeals_core::search::{Column, Condition, DealFilter, FilterValue, Operator, Page, Pagination, Predicate, SortOrder};

use crate::database::repo_error;

/// Nullable columns are coerced so rows always map onto `Deal`.
const DEAL_COLUMNS: &str = "id, title, slug, departure_city, destination_city, price, currency, \
     travel_dates, affiliate_url, content, COALESCE(image_url, '') AS image_url, published, \
     original_price, expires_at, scheduled_at, click_count, COALESCE(tags, '{}') AS tags, \
     created_at, updated_at";

pub struct PgDealRepository {
    pool: PgPool,
}

impl PgDealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct DealRow {
    id: i64,
    title: String,
    slug: String,
    departure_city: String,
    destination_city: String,
    price: i32,
    currency: String,
    travel_dates: String,
    affiliate_url: String,
    content: String,
    image_url: String,
    published: bool,
    original_price: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
    scheduled_at: Option<DateTime<Utc>>,
    click_count: i32,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DealRow> for Deal {
    fn from(row: DealRow) -> Self {
        Deal {
            id: row.id,
            title: row.title,
            slug: row.slug,
            departure_city: row.departure_city,
            destination_city: row.destination_city,
            price: row.price,
            currency: row.currency,
            travel_dates: row.travel_dates,
            affiliate_url: row.affiliate_url,
            content: row.content,
            image_url: row.image_url,
            published: row.published,
            original_price: row.original_price,
            expires_at: row.expires_at,
            scheduled_at: row.scheduled_at,
            click_count: row.click_count,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DestinationRow {
    city: String,
    deal_count: i64,
}

// ============================================================================
// Filter Rendering
// ============================================================================

fn column_sql(column: Column) -> &'static str {
    match column {
        Column::Title => "title",
        Column::DepartureCity => "departure_city",
        Column::DestinationCity => "destination_city",
        Column::Price => "price",
        Column::Tags => "tags",
        Column::Published => "published",
        Column::ScheduledAt => "scheduled_at",
    }
}

fn order_by_sql(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Newest => "created_at DESC, id DESC",
        SortOrder::Oldest => "created_at ASC, id ASC",
        SortOrder::PriceAsc => "price ASC, id ASC",
        SortOrder::PriceDesc => "price DESC, id DESC",
    }
}

/// Escapes LIKE metacharacters; Postgres uses `\` as the default escape.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(s) => qb.push_bind(s.clone()),
        FilterValue::Int(n) => qb.push_bind(*n),
        FilterValue::Bool(b) => qb.push_bind(*b),
        FilterValue::Timestamp(t) => qb.push_bind(*t),
    };
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    let column = column_sql(predicate.column);

    match predicate.op {
        Operator::Eq => {
            qb.push(column).push(" = ");
            push_value(qb, &predicate.value);
        }
        Operator::EqIgnoreCase => {
            qb.push("LOWER(").push(column).push(") = LOWER(");
            push_value(qb, &predicate.value);
            qb.push(")");
        }
        Operator::ContainsIgnoreCase => {
            qb.push("LOWER(").push(column).push(") LIKE LOWER(");
            match &predicate.value {
                FilterValue::Text(needle) => {
                    qb.push_bind(format!("%{}%", escape_like(needle)));
                }
                other => push_value(qb, other),
            }
            qb.push(")");
        }
        Operator::Gte => {
            qb.push(column).push(" >= ");
            push_value(qb, &predicate.value);
        }
        Operator::Lte => {
            qb.push(column).push(" <= ");
            push_value(qb, &predicate.value);
        }
        Operator::HasElement => {
            push_value(qb, &predicate.value);
            qb.push(" = ANY(").push(column).push(")");
        }
        Operator::NullOrLte => {
            qb.push("(").push(column).push(" IS NULL OR ").push(column).push(" <= ");
            push_value(qb, &predicate.value);
            qb.push(")");
        }
    }
}

/// Appends the filter's conditions joined by AND. `has_where` tells whether
/// the statement already carries a WHERE clause.
fn push_conditions(qb: &mut QueryBuilder<'static, Postgres>, filter: &DealFilter, has_where: bool) {
    for (i, condition) in filter.conditions().iter().enumerate() {
        qb.push(if i == 0 && !has_where { " WHERE " } else { " AND " });
        match condition {
            Condition::Is(predicate) => push_predicate(qb, predicate),
            Condition::AnyOf(predicates) => {
                qb.push("(");
                for (j, predicate) in predicates.iter().enumerate() {
                    if j > 0 {
                        qb.push(" OR ");
                    }
                    push_predicate(qb, predicate);
                }
                qb.push(")");
            }
        }
    }
}

fn count_query(filter: &DealFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM deals");
    push_conditions(&mut qb, filter, false);
    qb
}

fn page_query(filter: &DealFilter, sort: SortOrder, pagination: Pagination) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM deals", DEAL_COLUMNS));
    push_conditions(&mut qb, filter, false);
    qb.push(" ORDER BY ").push(order_by_sql(sort));
    qb.push(" LIMIT ").push_bind(pagination.limit);
    qb.push(" OFFSET ").push_bind(pagination.offset());
    qb
}

fn by_slug_query(slug: &str, filter: &DealFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM deals WHERE slug = ", DEAL_COLUMNS));
    qb.push_bind(slug.to_string());
    push_conditions(&mut qb, filter, true);
    qb
}

fn destinations_query(now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT destination_city AS city, COUNT(*) AS deal_count FROM deals");
    push_conditions(&mut qb, &DealFilter::visible_at(now), false);
    qb.push(" GROUP BY destination_city ORDER BY deal_count DESC, destination_city ASC");
    qb
}

// ============================================================================
// Repository
// ============================================================================

#[async_trait]
impl DealRepository for PgDealRepository {
    async fn search(
        &self,
        filter: &DealFilter,
        sort: SortOrder,
        pagination: Pagination,
    ) -> RepoResult<Page<Deal>> {
        let mut count = count_query(filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(repo_error)?;

        let mut page = page_query(filter, sort, pagination);
        let rows: Vec<DealRow> = page
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(Page {
            items: rows.into_iter().map(Deal::from).collect(),
            total,
        })
    }

    async fn find_by_slug(&self, slug: &str, filter: &DealFilter) -> RepoResult<Option<Deal>> {
        let mut qb = by_slug_query(slug, filter);
        let row: Option<DealRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(row.map(Deal::from))
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Deal>> {
        let row = sqlx::query_as::<_, DealRow>(&format!("SELECT {} FROM deals WHERE id = $1", DEAL_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(row.map(Deal::from))
    }

    async fn slug_exists(&self, slug: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM deals WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(repo_error)
    }

    async fn insert(&self, deal: &NewDeal) -> RepoResult<Deal> {
        let sql = format!(
            r#"
            INSERT INTO deals (title, slug, departure_city, destination_city, price, currency,
                               travel_dates, affiliate_url, content, image_url, published,
                               original_price, expires_at, scheduled_at, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
            RETURNING {}
            "#,
            DEAL_COLUMNS
        );

        let row = sqlx::query_as::<_, DealRow>(&sql)
            .bind(&deal.title)
            .bind(&deal.slug)
            .bind(&deal.departure_city)
            .bind(&deal.destination_city)
            .bind(deal.price)
            .bind(&deal.currency)
            .bind(&deal.travel_dates)
            .bind(&deal.affiliate_url)
            .bind(&deal.content)
            .bind(&deal.image_url)
            .bind(deal.published)
            .bind(deal.original_price)
            .bind(deal.expires_at)
            .bind(deal.scheduled_at)
            .bind(&deal.tags)
            .bind(deal.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(row.into())
    }

    async fn update(&self, deal: &Deal) -> RepoResult<Option<Deal>> {
        let sql = format!(
            r#"
            UPDATE deals
            SET title = $1, slug = $2, departure_city = $3, destination_city = $4,
                price = $5, currency = $6, travel_dates = $7, affiliate_url = $8,
                content = $9, image_url = $10, published = $11, original_price = $12,
                expires_at = $13, scheduled_at = $14, tags = $15, updated_at = $16
            WHERE id = $17
            RETURNING {}
            "#,
            DEAL_COLUMNS
        );

        let row = sqlx::query_as::<_, DealRow>(&sql)
            .bind(&deal.title)
            .bind(&deal.slug)
            .bind(&deal.departure_city)
            .bind(&deal.destination_city)
            .bind(deal.price)
            .bind(&deal.currency)
            .bind(&deal.travel_dates)
            .bind(&deal.affiliate_url)
            .bind(&deal.content)
            .bind(&deal.image_url)
            .bind(deal.published)
            .bind(deal.original_price)
            .bind(deal.expires_at)
            .bind(deal.scheduled_at)
            .bind(&deal.tags)
            .bind(deal.updated_at)
            .bind(deal.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(row.map(Deal::from))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM deals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_clicks(&self, slug: &str) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE deals SET click_count = click_count + 1 WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn destinations(&self, now: DateTime<Utc>) -> RepoResult<Vec<Destination>> {
        let mut qb = destinations_query(now);
        let rows: Vec<DestinationRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(repo_error)?;

        Ok(rows
            .into_iter()
            .map(|row| Destination { city: row.city, deal_count: row.deal_count })
            .collect())
    }
}
