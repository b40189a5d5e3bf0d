use axum::{
    extract::State,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use flydeals_shared::pii::redact_email;
use flydeals_shared::Masked;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::middleware::{AdminSession, SESSION_COOKIE};
use crate::state::{AppState, CookiePolicy};

/// `POST /login`, mounted under `/admin` outside the auth gate.
pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// `POST /logout`, mounted under `/admin` behind the auth gate.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Masked<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminInfo {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub admin: AdminInfo,
}

fn session_cookie(token: String, policy: CookiePolicy, max_age: chrono::Duration) -> Cookie<'static> {
    let same_site = if policy.production { SameSite::None } else { SameSite::Lax };
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(policy.production)
        .same_site(same_site)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.expose().is_empty() {
        return Err(AppError::Validation("email and password are required".to_string()));
    }

    let admin = state.admins.find_by_email(&email).await?;
    let verified = state
        .credentials
        .check(req.password.expose(), admin.as_ref().map(|a| a.password_hash.expose().as_str()))
        .await;

    let admin = match admin {
        Some(admin) if verified => admin,
        _ => {
            tracing::warn!("Failed login attempt for {}", redact_email(&email));
            return Err(AppError::Unauthorized("Invalid email or password".to_string()));
        }
    };

    let token = state
        .sessions
        .issue(admin.id, &admin.email)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token encoding failed: {}", e)))?;

    tracing::info!("Admin {} logged in", admin.id);

    let cookie = session_cookie(token.clone(), state.cookies, state.sessions.ttl());
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            admin: AdminInfo {
                id: admin.id,
                email: admin.email,
            },
        }),
    ))
}

/// POST /admin/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    tracing::info!("Admin {} logged out", session.admin_id);
    // Added rather than removed: bearer-authenticated requests carry no cookie
    // for the jar to diff against.
    let mut expired = session_cookie(String::new(), state.cookies, chrono::Duration::zero());
    expired.make_removal();
    (jar.add(expired), Json(json!({ "message": "Logged out" })))
}
