use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use flydeals_shared::pii::redact_email;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Identity of the admin behind a request, inserted by [`require_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub admin_id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Copy)]
enum TokenSource {
    Header,
    Cookie,
}

/// Bearer header wins; the cookie is only consulted when no bearer token is sent.
fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<(String, TokenSource)> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        let token = bearer.token().trim();
        if !token.is_empty() {
            return Some((token.to_string(), TokenSource::Header));
        }
    }
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim())
        .filter(|value| !value.is_empty())
        .map(|value| (value.to_string(), TokenSource::Cookie))
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some((token, source)) = extract_token(req.headers(), &jar) else {
        tracing::debug!("No session token on {} {}", req.method(), req.uri().path());
        return Err(AppError::Unauthorized("Authentication required".to_string()));
    };

    let claims = state.sessions.validate(&token).map_err(|e| {
        tracing::warn!(source = ?source, reason = %e, "Rejected admin session token");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    tracing::debug!(
        source = ?source,
        admin_id = claims.admin_id,
        email = %redact_email(&claims.email),
        "Admin session accepted"
    );

    req.extensions_mut().insert(AdminSession {
        admin_id: claims.admin_id,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
