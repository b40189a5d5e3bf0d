use flydeals_store::DbClient;
use tracing::{error, info, warn};

use crate::state::Readiness;

/// Background database bring-up: ping, migrate, then flip `readiness`.
///
/// Runs once. On failure the flag stays down and storage-backed routes keep
/// answering 503 until the process is restarted.
pub async fn init_storage(db: DbClient, readiness: Readiness) -> bool {
    info!("Connecting to database...");

    if let Err(e) = db.ping().await {
        error!("Failed to reach database: {}", e);
        warn!("Database-dependent endpoints will return 503");
        return false;
    }

    if let Err(e) = db.migrate().await {
        error!("Failed to run migrations: {}", e);
        warn!("Database-dependent endpoints will return 503");
        return false;
    }

    readiness.mark_ready();
    info!("Database ready");
    true
}
