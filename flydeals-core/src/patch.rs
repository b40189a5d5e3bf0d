use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::models::{normalize_tags, Deal};
use crate::slug::base_slug;
use crate::{CoreError, CoreResult};

/// Partial update of a deal.
///
/// Every field is presence-aware: an omitted field leaves the deal untouched,
/// a present one overwrites it, including `0`, `false` and `[]`. Nullable
/// columns use `Option<Option<_>>` so that `null` (or `""` for timestamps)
/// clears the value while omission keeps it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DealPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub departure_city: Option<String>,
    #[serde(default)]
    pub destination_city: Option<String>,
    #[serde(default)]
    pub price: Option<i32>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub travel_dates: Option<String>,
    #[serde(default)]
    pub affiliate_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub original_price: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl DealPatch {
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("title", &self.title),
            ("departure_city", &self.departure_city),
            ("destination_city", &self.destination_city),
            ("currency", &self.currency),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(CoreError::ValidationError(format!("{} cannot be empty", name)));
            }
        }
        if matches!(self.price, Some(p) if p <= 0) {
            return Err(CoreError::ValidationError("price must be positive".to_string()));
        }
        Ok(())
    }

    /// Writes the present fields onto `deal` and stamps `updated_at`.
    ///
    /// A changed title regenerates the slug without re-checking uniqueness.
    /// Resending the current title keeps the slug, suffix included.
    pub fn apply(self, deal: &mut Deal, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            if title != deal.title {
                deal.slug = base_slug(&title);
                deal.title = title;
            }
        }
        if let Some(v) = self.departure_city {
            deal.departure_city = v;
        }
        if let Some(v) = self.destination_city {
            deal.destination_city = v;
        }
        if let Some(v) = self.price {
            deal.price = v;
        }
        if let Some(v) = self.currency {
            deal.currency = v;
        }
        if let Some(v) = self.travel_dates {
            deal.travel_dates = v;
        }
        if let Some(v) = self.affiliate_url {
            deal.affiliate_url = v;
        }
        if let Some(v) = self.content {
            deal.content = v;
        }
        if let Some(v) = self.image_url {
            deal.image_url = v;
        }
        if let Some(v) = self.published {
            deal.published = v;
        }
        if let Some(v) = self.original_price {
            deal.original_price = v;
        }
        if let Some(v) = self.expires_at {
            deal.expires_at = v;
        }
        if let Some(v) = self.scheduled_at {
            deal.scheduled_at = v;
        }
        if let Some(tags) = self.tags {
            deal.tags = normalize_tags(tags);
        }
        deal.updated_at = now;
    }
}

/// Only called for present keys, so `null` becomes `Some(None)`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn nullable_timestamp<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_timestamp(deserializer).map(Some)
}

/// RFC 3339 timestamp where `null` and `""` both mean "not set".
pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| serde::de::Error::custom(format!("invalid RFC 3339 timestamp '{}': {}", s, e))),
    }
}
