pub mod admin_repo;
pub mod analytics_repo;
pub mod app_config;
pub mod database;
pub mod deal_repo;
pub mod price_alert_repo;
pub mod subscriber_repo;

pub use admin_repo::PgAdminRepository;
pub use analytics_repo::PgAnalyticsRepository;
pub use database::DbClient;
pub use deal_repo::PgDealRepository;
pub use price_alert_repo::PgPriceAlertRepository;
pub use subscriber_repo::PgSubscriberRepository;
