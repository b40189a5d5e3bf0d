use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod auth;
pub mod credentials;
pub mod deals;
pub mod error;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod price_alerts;
pub mod session;
pub mod state;
pub mod subscribers;
pub mod worker;

pub use state::AppState;

/// Builds the full router.
///
/// Every route except `/health` sits behind the storage gate; the `/admin`
/// group (apart from `/admin/login`) additionally requires a session.
pub fn app(state: AppState) -> Router {
    let admin = Router::new()
        .merge(deals::admin_routes())
        .merge(analytics::admin_routes())
        .merge(subscribers::admin_routes())
        .merge(auth::admin_routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::require_admin))
        // Added after the gate so it stays public
        .merge(auth::routes());

    let storage_backed = Router::new()
        .merge(deals::routes())
        .merge(subscribers::routes())
        .merge(price_alerts::routes())
        .nest("/admin", admin)
        .route_layer(from_fn_with_state(state.clone(), middleware::require_storage));

    Router::new()
        .merge(storage_backed)
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
