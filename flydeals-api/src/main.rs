use std::net::SocketAddr;

use anyhow::Context;
use chrono::Duration;
use flydeals_api::{
    app,
    credentials::CredentialVerifier,
    session::SessionCodec,
    state::{AppState, CookiePolicy, Readiness},
    worker,
};
use flydeals_store::{app_config::Config, DbClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flydeals_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting FlyDeals API on port {}", config.server.port);

    if config.uses_default_secret() {
        tracing::warn!("auth.jwt_secret is the built-in default; set JWT_SECRET before deploying");
    }

    // Lazy pool: the listener binds even while the database is down
    let db = DbClient::connect_lazy(&config.database).context("Invalid database configuration")?;

    let credentials = CredentialVerifier::new(config.auth.bcrypt_cost).context("Invalid bcrypt cost")?;
    let sessions = SessionCodec::new(&config.auth.jwt_secret, Duration::hours(config.auth.session_ttl_hours));
    let readiness = Readiness::new();

    let app_state = AppState::postgres(
        &db,
        sessions,
        credentials,
        CookiePolicy {
            production: config.server.production,
        },
        readiness.clone(),
    );

    tokio::spawn(worker::init_storage(db, readiness));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
