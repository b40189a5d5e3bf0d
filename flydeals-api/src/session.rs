use std::collections::HashSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The only algorithm a session token may be signed with.
const ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub admin_id: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unexpected signing algorithm {0:?}")]
    Algorithm(Algorithm),
    #[error("token expired")]
    Expired,
    #[error("admin id {0} is not a positive integer")]
    InvalidSubject(i64),
    #[error("malformed or tampered token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

// ============================================================================
// Codec
// ============================================================================

/// Issues and validates stateless HS256 admin session tokens.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, admin_id: i64, email: &str) -> Result<String, SessionError> {
        self.issue_at(admin_id, email, Utc::now())
    }

    /// Validity is measured in whole seconds: `now` is truncated to the second,
    /// so the token is accepted on `[trunc(now), trunc(now) + ttl)`.
    pub fn issue_at(&self, admin_id: i64, email: &str, now: DateTime<Utc>) -> Result<String, SessionError> {
        let issued = now.trunc_subsecs(0);
        let claims = SessionClaims {
            admin_id,
            email: email.to_string(),
            iat: issued.timestamp(),
            exp: (issued + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(ALGORITHM), &claims, &self.encoding)?)
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.validate_at(token, Utc::now())
    }

    /// Header algorithm first, then signature, then `now < exp` with no leeway.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let header = decode_header(token)?;
        if header.alg != ALGORITHM {
            return Err(SessionError::Algorithm(header.alg));
        }

        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let claims = decode::<SessionClaims>(token, &self.decoding, &validation)?.claims;

        if now.timestamp() >= claims.exp {
            return Err(SessionError::Expired);
        }
        if claims.admin_id <= 0 {
            return Err(SessionError::InvalidSubject(claims.admin_id));
        }
        Ok(claims)
    }
}
