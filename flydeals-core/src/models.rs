use chrono::{DateTime, Utc};
use flydeals_shared::Masked;
use serde::{Deserialize, Serialize};

/// Currency applied to deals and price alerts created without one.
pub const DEFAULT_CURRENCY: &str = "EUR";

// ============================================================================
// Deals
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub departure_city: String,
    pub destination_city: String,
    pub price: i32,
    pub currency: String,
    pub travel_dates: String,
    pub affiliate_url: String,
    pub content: String,
    pub image_url: String,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub click_count: i32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a deal sits in its publication lifecycle at a given instant.
///
/// `expires_at` plays no part here: expiry is displayed, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Draft,
    Scheduled,
    Live,
}

impl Deal {
    pub fn visibility_at(&self, now: DateTime<Utc>) -> Visibility {
        match (self.published, self.scheduled_at) {
            (false, _) => Visibility::Draft,
            (true, Some(at)) if at > now => Visibility::Scheduled,
            (true, _) => Visibility::Live,
        }
    }

    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.visibility_at(now) == Visibility::Live
    }
}

/// A validated deal ready to be inserted. The slug is already unique.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeal {
    pub title: String,
    pub slug: String,
    pub departure_city: String,
    pub destination_city: String,
    pub price: i32,
    pub currency: String,
    pub travel_dates: String,
    pub affiliate_url: String,
    pub content: String,
    pub image_url: String,
    pub published: bool,
    pub original_price: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub city: String,
    pub deal_count: i64,
}

/// Trims tags and drops the blank ones.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

// ============================================================================
// Admins
// ============================================================================

/// Admin account. Deliberately not `Serialize`: it only ever leaves storage
/// to be checked by the login handler.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: i64,
    pub email: String,
    pub password_hash: Masked<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Newsletter & Price Alerts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: i64,
    pub email: String,
    pub departure_city: String,
    pub destination_city: String,
    pub target_price: i32,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceAlert {
    pub email: String,
    pub departure_city: String,
    pub destination_city: String,
    pub target_price: i32,
    pub currency: String,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_deals: i64,
    pub published_deals: i64,
    pub total_clicks: i64,
    pub subscribers: i64,
    pub top_deals: Vec<TopDeal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDeal {
    pub id: i64,
    pub title: String,
    pub click_count: i32,
}
