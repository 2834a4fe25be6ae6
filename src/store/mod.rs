//! Identity store connection lifecycle.
//!
//! [`Database`] owns the single live [`UserStore`] handle and hides the
//! store's availability behind a bounded retry loop: callers ask for a
//! handle with [`Database::acquire`] and either get the live one or a
//! [`StoreError::Unavailable`] after the retry budget is spent. Exhausted
//! retries mean "temporarily unavailable", never "token invalid" — the
//! auth layer keeps the two outcomes distinct all the way to the wire.

pub mod users;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use users::{Contact, Message, User, UserStore};

/// Identity store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection attempts exhausted — the store may come back; the caller
    /// must not treat this as an authentication verdict.
    #[error("identity store unavailable after {attempts} connection attempts")]
    Unavailable { attempts: u32 },

    /// Uniqueness constraint hit on insert.
    #[error("record already exists")]
    Duplicate,

    #[error("store query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("store io failed: {0}")]
    Io(String),
}

/// How connection attempts are paced: total attempts and the fixed delay
/// between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Pluggable sleep so retry pacing is testable without real-time waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Connection lifecycle states, reported by [`Database::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the singleton store connection.
///
/// The connect-or-reuse decision runs under an async mutex: concurrent
/// callers finding the store disconnected queue on the lock, the first one
/// connects, and the rest observe the handle it installed.
pub struct Database {
    path: PathBuf,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    handle: tokio::sync::Mutex<Option<Arc<UserStore>>>,
    state: Mutex<ConnState>,
}

impl Database {
    /// Create a resilience layer over the store at `path` with the default
    /// policy (3 attempts, 2s apart).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_policy(path, RetryPolicy::default(), Arc::new(TokioSleeper))
    }

    /// Create with an explicit policy and sleeper (tests inject both).
    pub fn with_policy(
        path: impl AsRef<Path>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            policy,
            sleeper,
            handle: tokio::sync::Mutex::new(None),
            state: Mutex::new(ConnState::Disconnected),
        }
    }

    /// Return the live store handle, connecting first if necessary.
    ///
    /// Retries block the calling operation for at most
    /// `(max_attempts - 1) * delay`; callers should treat that as a latency
    /// spike, not an error, until [`StoreError::Unavailable`] surfaces.
    pub async fn acquire(&self) -> Result<Arc<UserStore>, StoreError> {
        let mut guard = self.handle.lock().await;
        if let Some(store) = guard.as_ref() {
            return Ok(store.clone());
        }

        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            *self.state.lock() = ConnState::Connecting;
            tracing::debug!(
                attempt = attempt,
                max = attempts,
                "Connecting to identity store"
            );

            match UserStore::open(&self.path) {
                Ok(store) => {
                    let store = Arc::new(store);
                    *guard = Some(store.clone());
                    *self.state.lock() = ConnState::Connected;
                    tracing::info!(path = %self.path.display(), "Identity store connected");
                    return Ok(store);
                }
                Err(e) => {
                    *self.state.lock() = ConnState::Disconnected;
                    tracing::warn!(
                        attempt = attempt,
                        max = attempts,
                        "Identity store connection failed: {e}"
                    );
                    if attempt < attempts {
                        self.sleeper.sleep(self.policy.delay).await;
                    }
                }
            }
        }

        Err(StoreError::Unavailable { attempts })
    }

    /// Single lightweight liveness probe, independent of the retry path.
    pub async fn health_check(&self) -> bool {
        if let Some(store) = self.handle.lock().await.as_ref() {
            return store.ping();
        }
        match UserStore::open(&self.path) {
            Ok(store) => store.ping(),
            Err(_) => false,
        }
    }

    /// Release the connection. Idempotent; called from every shutdown path.
    pub async fn close(&self) {
        let mut guard = self.handle.lock().await;
        if guard.take().is_some() {
            tracing::info!("Identity store connection closed");
        }
        *self.state.lock() = ConnState::Disconnected;
    }

    /// Current connection state (observational, for the health endpoint).
    pub fn state(&self) -> ConnState {
        *self.state.lock()
    }
}
