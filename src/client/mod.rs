//! Session-guarded terminal client.
//!
//! The client runtime owns exactly one [`SessionGuard`] and one
//! [`Router`], wired together by dependency injection in the shell —
//! there is no global session state. The guard persists its token across
//! two storage channels and makes the two-phase (local, then
//! authoritative) trust decision before any protected route renders.

pub mod api;
pub mod router;
pub mod session;
pub mod shell;
pub mod storage;

pub use api::ApiClient;
pub use router::{RouteParams, Router};
pub use session::{SessionGuard, SessionState, SessionUser};
pub use storage::{FileTokenStore, TokenStorage, TokenStorageStack};
