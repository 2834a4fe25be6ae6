//! Identity & session core.
//!
//! Provides:
//! - Account signup with email/password (iterated SHA-256, 100k rounds +
//!   per-user salt, stored in the identity store)
//! - Stateless session tokens (compact HS256-signed, 7-day expiry) — the
//!   server verifies tokens, it never stores them
//! - Token verification that re-resolves the subject against the live
//!   identity store, so deleting an account invalidates every token it
//!   was ever issued
//!
//! ## Design Decisions
//! - Store unavailability is its own failure mode. A token checked while
//!   the store is down is *unverifiable*, not invalid; the two surface as
//!   500 vs 401 and must never be conflated.
//! - Login failures are uniform: unknown email and wrong password produce
//!   the same error, so the endpoint cannot be used to enumerate accounts.

pub mod service;
pub mod tokens;

pub use service::{AuthService, UserProfile};
pub use tokens::{Claims, TokenService};

use axum::http::StatusCode;

/// Authentication and validation failures, mapped 1:1 onto response codes
/// at the gateway boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing or malformed request fields. Identifies the field class,
    /// never echoes credentials.
    #[error("{0}")]
    Validation(String),

    /// Bad email or password — one message for both, to prevent account
    /// enumeration.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Signature mismatch, malformed payload, expired token, or a subject
    /// that no longer resolves. No further detail is leaked.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Signup with an email that is already registered.
    #[error("An account with this email already exists")]
    DuplicateEmail,

    /// The identity store exhausted its connection retries. Distinct from
    /// `InvalidToken`: the session may well be fine.
    #[error("Service temporarily unavailable")]
    StoreUnavailable,

    /// Anything unexpected. Logged server-side; the response stays generic.
    #[error("Internal server error")]
    Internal,
}

impl AuthError {
    /// HTTP status for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::StoreUnavailable | AuthError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_unavailable_is_not_unauthorized() {
        assert_eq!(
            AuthError::StoreUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_ne!(
            AuthError::StoreUnavailable.status_code(),
            AuthError::InvalidToken.status_code()
        );
    }

    #[test]
    fn credential_failures_share_status_and_message() {
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        // The message carries no hint about which half was wrong
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}
