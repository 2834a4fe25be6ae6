//! Client-side session guard.
//!
//! One guard instance per client runtime, injected into the shell — not a
//! global. It makes the two-phase trust decision that gates every
//! protected navigation:
//!
//! 1. **Local check** ([`SessionGuard::is_authenticated`]): structural
//!    decode of the persisted token + expiry comparison. No network, no
//!    signature verification — the client never holds the signing secret.
//! 2. **Authoritative check** ([`SessionGuard::verify_with_server`]): a
//!    round trip that re-resolves the subject against the live store.
//!
//! The checks are sequential, never raced: the server is only consulted
//! after the local check passes, and the server's verdict wins on
//! conflict. A verification completing after a logout is discarded via a
//! generation counter, so a stale result cannot resurrect the session.

use base64::Engine;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

use super::api::ApiClient;
use super::router::Router;
use super::storage::TokenStorageStack;

/// The public entry route; the only route reachable unauthenticated.
const ENTRY_ROUTE: &str = "/";

/// Cached subject attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

/// In-memory session state. Advisory only — the server re-verifies
/// independently on every request.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

/// Token payload fields the local check needs.
#[derive(Debug, Deserialize)]
struct LocalClaims {
    sub: String,
    email: String,
    exp: u64,
}

/// Session trust decisions + token persistence for one client runtime.
pub struct SessionGuard {
    state: SessionState,
    storage: TokenStorageStack,
    api: ApiClient,
    /// Bumped on every login/logout; in-flight verifications from an older
    /// generation are discarded.
    generation: u64,
}

impl SessionGuard {
    pub fn new(api: ApiClient, storage: TokenStorageStack) -> Self {
        Self {
            state: SessionState::default(),
            storage,
            api,
            generation: 0,
        }
    }

    /// Current cached state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The API client this guard verifies through.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Fast local check: persisted token + structural expiry comparison.
    /// Non-authoritative — an expired token logs the session out, a valid
    /// one updates state optimistically.
    pub fn is_authenticated(&mut self) -> bool {
        let Some(token) = self.storage.load() else {
            self.state.is_authenticated = false;
            return false;
        };

        match decode_unverified_claims(&token) {
            Ok(claims) if claims.exp > epoch_secs() => {
                self.state.is_authenticated = true;
                self.state.user = Some(SessionUser {
                    id: claims.sub,
                    email: claims.email,
                });
                self.state.token = Some(token);
                tracing::debug!("Session token valid (local check)");
                true
            }
            Ok(_) => {
                tracing::debug!("Session token expired (local check)");
                self.logout();
                false
            }
            Err(e) => {
                tracing::debug!("Session token unreadable: {e}");
                self.logout();
                false
            }
        }
    }

    /// Authoritative check. On a positive response with a resolved subject,
    /// updates the cached user attributes and returns true. On any negative
    /// or error response returns false *without* clearing the session —
    /// that decision belongs to the caller.
    pub async fn verify_with_server(&mut self, token: &str) -> bool {
        let generation = self.generation;
        let result = self.api.verify(token).await;
        match result {
            Ok(payload) if payload.success => match payload.user {
                Some(user) => self.apply_server_identity(generation, user.id, user.email),
                None => false,
            },
            Ok(payload) => {
                tracing::debug!(
                    "Server rejected session token: {}",
                    payload.error.as_deref().unwrap_or("no detail")
                );
                false
            }
            Err(e) => {
                tracing::warn!("Server verification unreachable: {e}");
                false
            }
        }
    }

    /// Apply a completed server verification, unless the session changed
    /// while the request was in flight.
    fn apply_server_identity(&mut self, generation: u64, id: String, email: String) -> bool {
        if self.generation != generation {
            tracing::debug!("Discarding stale verification result");
            return false;
        }
        self.state.user = Some(SessionUser { id, email });
        true
    }

    /// Composite gate for protected navigation. Local check first; only a
    /// locally valid token earns the server round trip. The server's
    /// rejection of a locally valid token (revoked, account deleted) logs
    /// out and redirects to the entry route.
    pub async fn require_auth(&mut self, router: &mut Router) -> bool {
        if router.current_route() == ENTRY_ROUTE {
            tracing::debug!("On entry route, skipping auth check");
            return false;
        }

        if self.is_authenticated() {
            if let Some(token) = self.state.token.clone() {
                if self.verify_with_server(&token).await {
                    return true;
                }
                tracing::info!("Server rejected session, logging out");
                self.logout();
                router.navigate(ENTRY_ROUTE);
                return false;
            }
        }

        router.navigate(ENTRY_ROUTE);
        false
    }

    /// Persist a fresh token to every storage channel and mark the session
    /// authenticated.
    pub fn login(&mut self, token: &str, user: Option<SessionUser>) {
        if let Err(e) = self.storage.store(token) {
            tracing::warn!("Failed to persist session token: {e}");
        }
        self.generation += 1;
        self.state = SessionState {
            is_authenticated: true,
            token: Some(token.to_string()),
            user,
        };
        tracing::info!("Logged in");
    }

    /// Clear every storage channel and reset state. Idempotent.
    pub fn logout(&mut self) {
        self.storage.clear();
        self.generation += 1;
        self.state = SessionState::default();
    }
}

/// Structural decode of the token payload — no signature check. The
/// client treats tokens as opaque beyond "three segments, expiring".
fn decode_unverified_claims(token: &str) -> anyhow::Result<LocalClaims> {
    let mut segments = token.split('.');
    let payload = segments
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Token has no payload segment"))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
