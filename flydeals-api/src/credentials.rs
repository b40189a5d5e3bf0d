use std::sync::Arc;

/// Hashed once at startup so unknown emails cost as much as known ones.
const TIMING_DUMMY_PASSWORD: &str = "flydeals-unknown-account";

/// Checks `password` against a bcrypt hash. Malformed hashes count as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Runs bcrypt on the blocking pool and equalises the cost of failed lookups.
///
/// The dummy hash uses the cost passed to [`CredentialVerifier::new`]. Timing
/// only matches for unknown emails when stored admin hashes were created with
/// that same cost, so `auth.bcrypt_cost` must track the cost used when seeding
/// admins.
#[derive(Clone)]
pub struct CredentialVerifier {
    dummy_hash: Arc<str>,
}

impl CredentialVerifier {
    pub fn new(cost: u32) -> Result<Self, bcrypt::BcryptError> {
        let dummy_hash = hash_password(TIMING_DUMMY_PASSWORD, cost)?;
        Ok(Self { dummy_hash: dummy_hash.into() })
    }

    /// `stored_hash` is `None` when no account matched the email; a dummy
    /// verification still runs and the result is always `false`.
    pub async fn check(&self, password: &str, stored_hash: Option<&str>) -> bool {
        let known = stored_hash.is_some();
        let password = password.to_owned();
        let hash = stored_hash.map_or_else(|| self.dummy_hash.to_string(), str::to_owned);

        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Password verification task failed: {}", e);
                false
            });

        known && verified
    }
}
