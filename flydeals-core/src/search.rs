use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Deal;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// Predicate Model
// ============================================================================

/// Deal columns a filter may constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Title,
    DepartureCity,
    DestinationCity,
    Price,
    Tags,
    Published,
    ScheduledAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    EqIgnoreCase,
    ContainsIgnoreCase,
    Gte,
    Lte,
    /// The array column contains the value.
    HasElement,
    /// The column is NULL or not after the value.
    NullOrLte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i32),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

/// One `(column, operator, value)` constraint. The value is always bound as
/// a query parameter by the renderer, never spliced into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: Column,
    pub op: Operator,
    pub value: FilterValue,
}

impl Predicate {
    pub fn new(column: Column, op: Operator, value: FilterValue) -> Self {
        Self { column, op, value }
    }

    /// Evaluates the predicate against an in-memory deal with the same
    /// semantics the SQL renderer gives it.
    pub fn matches(&self, deal: &Deal) -> bool {
        match (self.column, self.op, &self.value) {
            (Column::Published, Operator::Eq, FilterValue::Bool(b)) => deal.published == *b,
            (Column::Price, Operator::Eq, FilterValue::Int(n)) => deal.price == *n,
            (Column::Price, Operator::Gte, FilterValue::Int(n)) => deal.price >= *n,
            (Column::Price, Operator::Lte, FilterValue::Int(n)) => deal.price <= *n,
            (Column::Tags, Operator::HasElement, FilterValue::Text(tag)) => deal.tags.iter().any(|t| t == tag),
            (Column::ScheduledAt, Operator::NullOrLte, FilterValue::Timestamp(ts)) => {
                deal.scheduled_at.map_or(true, |at| at <= *ts)
            }
            (column, op, FilterValue::Text(needle)) => {
                let Some(hay) = text_of(deal, column) else {
                    return false;
                };
                match op {
                    Operator::Eq => hay == needle,
                    Operator::EqIgnoreCase => hay.to_lowercase() == needle.to_lowercase(),
                    Operator::ContainsIgnoreCase => hay.to_lowercase().contains(&needle.to_lowercase()),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

fn text_of(deal: &Deal, column: Column) -> Option<&str> {
    match column {
        Column::Title => Some(&deal.title),
        Column::DepartureCity => Some(&deal.departure_city),
        Column::DestinationCity => Some(&deal.destination_city),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Is(Predicate),
    /// Satisfied when at least one predicate holds.
    AnyOf(Vec<Predicate>),
}

impl Condition {
    pub fn matches(&self, deal: &Deal) -> bool {
        match self {
            Condition::Is(p) => p.matches(deal),
            Condition::AnyOf(ps) => ps.iter().any(|p| p.matches(deal)),
        }
    }
}

/// AND-combination of conditions. The empty filter matches every deal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealFilter {
    conditions: Vec<Condition>,
}

impl DealFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deals the public may see at `now`: published and not scheduled later.
    pub fn visible_at(now: DateTime<Utc>) -> Self {
        Self::new()
            .and(Predicate::new(Column::Published, Operator::Eq, FilterValue::Bool(true)))
            .and(Predicate::new(Column::ScheduledAt, Operator::NullOrLte, FilterValue::Timestamp(now)))
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.conditions.push(Condition::Is(predicate));
        self
    }

    pub fn and_any(mut self, predicates: Vec<Predicate>) -> Self {
        if !predicates.is_empty() {
            self.conditions.push(Condition::AnyOf(predicates));
        }
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, deal: &Deal) -> bool {
        self.conditions.iter().all(|c| c.matches(deal))
    }
}

// ============================================================================
// Sorting & Pagination
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    /// Unknown values fall back to `Newest`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("oldest") => SortOrder::Oldest,
            Some("price_asc") => SortOrder::PriceAsc,
            Some("price_desc") => SortOrder::PriceDesc,
            _ => SortOrder::Newest,
        }
    }

    /// In-memory counterpart of the SQL ordering, ties broken by id.
    pub fn compare(&self, a: &Deal, b: &Deal) -> Ordering {
        let primary = match self {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::PriceAsc => a.price.cmp(&b.price),
            SortOrder::PriceDesc => b.price.cmp(&a.price),
        };
        primary.then_with(|| match self {
            SortOrder::Newest | SortOrder::PriceDesc => b.id.cmp(&a.id),
            SortOrder::Oldest | SortOrder::PriceAsc => a.id.cmp(&b.id),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    /// Lenient parsing: unparsable values take the defaults, page is at
    /// least 1 and the page size is clamped to `[1, MAX_PAGE_SIZE]`.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// A page of rows plus the total number of rows matching the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// ============================================================================
// Query String Parameters
// ============================================================================

/// Raw `GET /deals` query string. Everything is kept as text so malformed
/// numbers degrade to "ignored" instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DealSearchParams {
    pub q: Option<String>,
    pub departure: Option<String>,
    pub destination: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl DealSearchParams {
    /// Adds this request's constraints on top of `base`.
    pub fn apply_to(&self, base: DealFilter) -> DealFilter {
        let mut filter = base;

        if let Some(q) = non_blank(&self.q) {
            filter = filter.and_any(
                [Column::Title, Column::DepartureCity, Column::DestinationCity]
                    .into_iter()
                    .map(|c| Predicate::new(c, Operator::ContainsIgnoreCase, FilterValue::Text(q.to_string())))
                    .collect(),
            );
        }
        if let Some(departure) = non_blank(&self.departure) {
            filter = filter.and(Predicate::new(
                Column::DepartureCity,
                Operator::EqIgnoreCase,
                FilterValue::Text(departure.to_string()),
            ));
        }
        if let Some(destination) = non_blank(&self.destination) {
            filter = filter.and(Predicate::new(
                Column::DestinationCity,
                Operator::EqIgnoreCase,
                FilterValue::Text(destination.to_string()),
            ));
        }
        if let Some(min) = parse_price(&self.min_price) {
            filter = filter.and(Predicate::new(Column::Price, Operator::Gte, FilterValue::Int(min)));
        }
        if let Some(max) = parse_price(&self.max_price) {
            filter = filter.and(Predicate::new(Column::Price, Operator::Lte, FilterValue::Int(max)));
        }
        if let Some(tag) = non_blank(&self.tag) {
            filter = filter.and(Predicate::new(Column::Tags, Operator::HasElement, FilterValue::Text(tag.to_string())));
        }

        filter
    }

    pub fn sort(&self) -> SortOrder {
        SortOrder::parse(self.sort.as_deref())
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_price(value: &Option<String>) -> Option<i32> {
    value.as_deref().and_then(|v| v.trim().parse::<i32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::deal;
    use chrono::Duration;

    fn params(pairs: &[(&str, &str)]) -> DealSearchParams {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_empty_params_add_no_conditions() {
        let filter = params(&[]).apply_to(DealFilter::new());
        assert!(filter.is_empty());
    }

    #[test]
    fn test_free_text_is_an_or_group() {
        let filter = params(&[("q", "  lisb ")]).apply_to(DealFilter::new());
        assert_eq!(filter.conditions().len(), 1);
        match &filter.conditions()[0] {
            Condition::AnyOf(ps) => {
                assert_eq!(ps.len(), 3);
                assert!(ps.iter().all(|p| p.value == FilterValue::Text("lisb".to_string())));
            }
            other => panic!("expected OR group, got {:?}", other),
        }

        let mut d = deal(1, "Weekend break");
        assert!(filter.matches(&d)); // destination Lisbon
        d.destination_city = "Porto".to_string();
        assert!(!filter.matches(&d));
        d.title = "LISBON stopover".to_string();
        assert!(filter.matches(&d));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let filter = params(&[("min_price", "100"), ("max_price", "200")]).apply_to(DealFilter::new());
        let mut d = deal(1, "x");
        for (price, expected) in [(99, false), (100, true), (150, true), (200, true), (201, false)] {
            d.price = price;
            assert_eq!(filter.matches(&d), expected, "price {}", price);
        }
    }

    #[test]
    fn test_unparsable_price_is_ignored_but_other_filters_apply() {
        let filter = params(&[("min_price", "cheap"), ("max_price", "300"), ("departure", "berlin")])
            .apply_to(DealFilter::new());
        assert_eq!(filter.conditions().len(), 2);

        let mut d = deal(1, "x");
        d.price = 1;
        assert!(filter.matches(&d));
        d.departure_city = "Paris".to_string();
        assert!(!filter.matches(&d));
    }

    #[test]
    fn test_city_filters_are_exact_ignoring_case() {
        let filter = params(&[("destination", "LISBON")]).apply_to(DealFilter::new());
        let mut d = deal(1, "x");
        assert!(filter.matches(&d));
        d.destination_city = "Lisbon Airport".to_string();
        assert!(!filter.matches(&d));
    }

    #[test]
    fn test_tag_membership() {
        let filter = params(&[("tag", "beach")]).apply_to(DealFilter::new());
        let mut d = deal(1, "x");
        assert!(!filter.matches(&d));
        d.tags = vec!["city".to_string(), "beach".to_string()];
        assert!(filter.matches(&d));
    }

    #[test]
    fn test_visible_filter() {
        let now = Utc::now();
        let filter = DealFilter::visible_at(now);
        let mut d = deal(1, "x");
        assert!(filter.matches(&d));

        d.scheduled_at = Some(now + Duration::minutes(5));
        assert!(!filter.matches(&d));
        d.scheduled_at = Some(now);
        assert!(filter.matches(&d));

        d.published = false;
        d.scheduled_at = None;
        assert!(!filter.matches(&d));
    }

    #[test]
    fn test_sort_parsing_falls_back_to_newest() {
        assert_eq!(SortOrder::parse(None), SortOrder::Newest);
        assert_eq!(SortOrder::parse(Some("price_asc")), SortOrder::PriceAsc);
        assert_eq!(SortOrder::parse(Some("price_desc")), SortOrder::PriceDesc);
        assert_eq!(SortOrder::parse(Some("oldest")), SortOrder::Oldest);
        assert_eq!(SortOrder::parse(Some("popular")), SortOrder::Newest);
    }

    #[test]
    fn test_sort_compare() {
        let mut a = deal(1, "a");
        let mut b = deal(2, "b");
        a.price = 50;
        b.price = 80;
        b.created_at = a.created_at + Duration::hours(1);

        assert_eq!(SortOrder::Newest.compare(&a, &b), Ordering::Greater);
        assert_eq!(SortOrder::Oldest.compare(&a, &b), Ordering::Less);
        assert_eq!(SortOrder::PriceAsc.compare(&a, &b), Ordering::Less);
        assert_eq!(SortOrder::PriceDesc.compare(&a, &b), Ordering::Greater);

        b.created_at = a.created_at;
        assert_eq!(SortOrder::Newest.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_pagination_defaults_and_clamping() {
        assert_eq!(Pagination::from_raw(None, None), Pagination { page: 1, limit: 20 });
        assert_eq!(Pagination::from_raw(Some("0"), Some("0")), Pagination { page: 1, limit: 1 });
        assert_eq!(Pagination::from_raw(Some("-4"), Some("500")), Pagination { page: 1, limit: 100 });
        assert_eq!(Pagination::from_raw(Some("abc"), Some("x")), Pagination { page: 1, limit: 20 });
        assert_eq!(Pagination::from_raw(Some("3"), Some("20")).offset(), 40);
    }
}
