//! Signup / login / verify / delete flows over the identity store.
//!
//! This is the single verification authority: every protected endpoint
//! funnels through [`AuthService::verify_token`], and collaborator routes
//! (contacts, messages) reuse the same gate at the gateway.

use std::sync::Arc;

use crate::store::{Database, StoreError, User};

use super::tokens::TokenService;
use super::AuthError;

/// Public projection of an identity record — what the wire sees.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub fullname: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            fullname: user.fullname.clone(),
        }
    }
}

/// Orchestrates credential checks and token issuance.
pub struct AuthService {
    db: Arc<Database>,
    tokens: TokenService,
    min_password_len: usize,
}

impl AuthService {
    pub fn new(db: Arc<Database>, tokens: TokenService, min_password_len: usize) -> Self {
        Self {
            db,
            tokens,
            min_password_len,
        }
    }

    /// Create an account and issue its first session token.
    pub async fn signup(
        &self,
        email: &str,
        fullname: &str,
        password: &str,
    ) -> Result<(String, UserProfile), AuthError> {
        let email = normalize_email(email);
        let fullname = fullname.trim();
        if email.is_empty() || fullname.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("All fields are required".into()));
        }
        if !email.contains('@') {
            return Err(AuthError::Validation("Invalid email address".into()));
        }
        if password.len() < self.min_password_len {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.min_password_len
            )));
        }

        let store = self.db.acquire().await.map_err(store_failure)?;
        let user = match store.create_user(&email, fullname, password) {
            Ok(user) => user,
            Err(StoreError::Duplicate) => return Err(AuthError::DuplicateEmail),
            Err(e) => return Err(store_failure(e)),
        };

        let token = self.tokens.issue(&user)?;
        if let Err(e) = store.touch_last_login(&user.id) {
            tracing::warn!(user_id = %user.id, "Failed to record first login: {e}");
        }

        tracing::info!(user_id = %user.id, "Account created");
        Ok((token, UserProfile::from(&user)))
    }

    /// Check credentials and issue a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, UserProfile), AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Email and password are required".into()));
        }

        let store = self.db.acquire().await.map_err(store_failure)?;
        let user = match store.authenticate(&email, password) {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(store_failure(e)),
        };

        let token = self.tokens.issue(&user)?;
        if let Err(e) = store.touch_last_login(&user.id) {
            tracing::warn!(user_id = %user.id, "Failed to record login: {e}");
        }

        tracing::info!(user_id = %user.id, "Login succeeded");
        Ok((token, UserProfile::from(&user)))
    }

    /// Authoritative token check: signature, expiry, and a live subject.
    pub async fn verify_token(&self, token: &str) -> Result<UserProfile, AuthError> {
        let user = self.tokens.verify(&self.db, token).await?;
        Ok(UserProfile::from(&user))
    }

    /// Resolve the token's subject, then delete the account and everything
    /// it owns. Previously issued tokens stop verifying immediately.
    pub async fn delete_account(&self, token: &str) -> Result<(), AuthError> {
        let user = self.tokens.verify(&self.db, token).await?;
        let store = self.db.acquire().await.map_err(store_failure)?;
        match store.delete_user(&user.id) {
            Ok(true) => {
                tracing::info!(user_id = %user.id, "Account deleted");
                Ok(())
            }
            // Verified a moment ago but gone now — treat as already deleted
            Ok(false) => Ok(()),
            Err(e) => Err(store_failure(e)),
        }
    }

    /// The identity store behind this service (collaborator routes use it
    /// after passing the verify gate).
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn store_failure(e: StoreError) -> AuthError {
    match e {
        StoreError::Unavailable { .. } => AuthError::StoreUnavailable,
        other => {
            tracing::error!("Identity store operation failed: {other}");
            AuthError::Internal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(tmp: &tempfile::TempDir) -> AuthService {
        let db = Arc::new(Database::new(tmp.path().join("threadline.db")));
        AuthService::new(db, TokenService::new("test-secret", 7), 6)
    }

    #[tokio::test]
    async fn signup_issues_token_and_records_login() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = test_service(&tmp);

        let (token, user) = svc
            .signup("Alice@Example.com", "Alice", "secret1")
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(token.split('.').count(), 3);

        let store = svc.database().acquire().await.unwrap();
        let record = store.find_by_id(&user.id).unwrap().unwrap();
        assert!(record.last_login_at.is_some());
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts_case_insensitively() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = test_service(&tmp);

        svc.signup("alice@example.com", "Alice", "secret1")
            .await
            .unwrap();
        let err = svc
            .signup("ALICE@example.com", "Alice Again", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = test_service(&tmp);

        let err = svc
            .signup("alice@example.com", "Alice", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_fields_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = test_service(&tmp);

        let err = svc.signup("", "Alice", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        let err = svc
            .signup("alice@example.com", "  ", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = test_service(&tmp);

        svc.signup("alice@example.com", "Alice", "secret1")
            .await
            .unwrap();

        let wrong_password = svc
            .login("alice@example.com", "not-the-password")
            .await
            .unwrap_err();
        let unknown_email = svc
            .login("ghost@example.com", "secret1")
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(
            wrong_password.status_code(),
            unknown_email.status_code()
        );
    }

    #[tokio::test]
    async fn login_with_case_folded_email() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = test_service(&tmp);

        let (_, created) = svc
            .signup("alice@example.com", "Alice", "secret1")
            .await
            .unwrap();
        let (token, user) = svc.login("ALICE@example.com", "secret1").await.unwrap();
        assert_eq!(user.id, created.id);

        let verified = svc.verify_token(&token).await.unwrap();
        assert_eq!(verified.id, created.id);
    }

    #[tokio::test]
    async fn delete_account_invalidates_tokens() {
        let tmp = tempfile::TempDir::new().unwrap();
        let svc = test_service(&tmp);

        let (token, _) = svc
            .signup("alice@example.com", "Alice", "secret1")
            .await
            .unwrap();
        assert!(svc.verify_token(&token).await.is_ok());

        svc.delete_account(&token).await.unwrap();
        assert!(matches!(
            svc.verify_token(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
