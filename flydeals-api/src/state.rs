use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flydeals_core::repository::{
    AdminRepository, AnalyticsRepository, DealRepository, PriceAlertRepository, SubscriberRepository,
};
use flydeals_store::{
    DbClient, PgAdminRepository, PgAnalyticsRepository, PgDealRepository, PgPriceAlertRepository,
    PgSubscriberRepository,
};

use crate::credentials::CredentialVerifier;
use crate::session::SessionCodec;

/// Set once the database has answered and migrations have run.
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    /// `Secure; SameSite=None` instead of `SameSite=Lax`.
    pub production: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub deals: Arc<dyn DealRepository>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub price_alerts: Arc<dyn PriceAlertRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub sessions: SessionCodec,
    pub credentials: CredentialVerifier,
    pub cookies: CookiePolicy,
    pub readiness: Readiness,
}

impl AppState {
    /// Wires every repository to the same Postgres pool.
    pub fn postgres(
        db: &DbClient,
        sessions: SessionCodec,
        credentials: CredentialVerifier,
        cookies: CookiePolicy,
        readiness: Readiness,
    ) -> Self {
        Self {
            deals: Arc::new(PgDealRepository::new(db.pool.clone())),
            subscribers: Arc::new(PgSubscriberRepository::new(db.pool.clone())),
            price_alerts: Arc::new(PgPriceAlertRepository::new(db.pool.clone())),
            admins: Arc::new(PgAdminRepository::new(db.pool.clone())),
            analytics: Arc::new(PgAnalyticsRepository::new(db.pool.clone())),
            sessions,
            credentials,
            cookies,
            readiness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_is_shared_between_clones() {
        let readiness = Readiness::new();
        let observer = readiness.clone();
        assert!(!observer.is_ready());
        readiness.mark_ready();
        assert!(observer.is_ready());
    }
}
