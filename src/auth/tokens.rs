//! Stateless session token issuance and verification.
//!
//! Tokens are compact HS256-signed values: three dot-separated base64url
//! segments (header, payload, signature). The payload carries the subject
//! id, the subject email, and issuance/expiry times. Nothing is persisted
//! server-side — a token is proven valid by its signature, its expiry, and
//! the continued existence of its subject in the identity store.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::store::{Database, StoreError, User};

use super::AuthError;

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject account id.
    pub sub: String,
    /// Subject email at issuance time (display convenience; the store is
    /// the authority).
    pub email: String,
    /// Issued-at, unix seconds.
    pub iat: u64,
    /// Expiry, unix seconds.
    pub exp: u64,
}

/// Issues and verifies session tokens with a process-wide secret that is
/// read-only after startup.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a service signing with `secret`, issuing tokens valid for
    /// `ttl_days`.
    pub fn new(secret: &str, ttl_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs(ttl_days * 24 * 60 * 60),
        }
    }

    /// Issue a token for an account. Callers are expected to persist an
    /// updated last-login timestamp on the identity record afterwards.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let iat = epoch_secs();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat,
            exp: iat + self.ttl.as_secs(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Token signing failed: {e}");
            AuthError::Internal
        })
    }

    /// Check signature and expiry only. Fails closed: any mismatch,
    /// malformed payload, or past expiry is `InvalidToken` with no detail.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Full verification: structural validity plus re-resolving the subject
    /// against the live identity store.
    ///
    /// A subject that no longer resolves is `InvalidToken` (a token for a
    /// deleted account must not authenticate). A store that cannot be
    /// reached is `StoreUnavailable` — never reported as an invalid token.
    pub async fn verify(&self, db: &Database, token: &str) -> Result<User, AuthError> {
        let claims = self.decode_claims(token)?;

        let store = db.acquire().await.map_err(|e| match e {
            StoreError::Unavailable { .. } => AuthError::StoreUnavailable,
            _ => AuthError::Internal,
        })?;

        match store.find_by_id(&claims.sub) {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthError::InvalidToken),
            Err(e) => {
                tracing::error!("Subject lookup failed during verify: {e}");
                Err(AuthError::StoreUnavailable)
            }
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
