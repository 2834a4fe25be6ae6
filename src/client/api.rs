//! HTTP client for the threadline gateway.
//!
//! Thin typed wrapper over reqwest. Auth endpoints return the wire
//! payloads as-is; protected endpoints take the bearer token explicitly —
//! the [`super::session::SessionGuard`] owns which token to present.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::auth::UserProfile;
use crate::store::{Contact, Message};

/// Response payload from signup/login/verify.
#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response payload from the health endpoint.
#[derive(Debug, Deserialize)]
pub struct HealthPayload {
    pub status: String,
    pub database: String,
    #[serde(default)]
    pub users: u64,
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ── Auth endpoints ──────────────────────────────────────────────

    pub async fn signup(
        &self,
        email: &str,
        fullname: &str,
        password: &str,
    ) -> Result<AuthPayload> {
        let response = self
            .http
            .post(self.url("/api/auth/signup"))
            .json(&serde_json::json!({
                "email": email,
                "fullname": fullname,
                "password": password,
            }))
            .send()
            .await
            .context("Signup request failed")?;
        response.json().await.context("Invalid signup response")
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .context("Login request failed")?;
        response.json().await.context("Invalid login response")
    }

    /// Authoritative token verification round trip.
    pub async fn verify(&self, token: &str) -> Result<AuthPayload> {
        let response = self
            .http
            .post(self.url("/api/auth/verify"))
            .json(&serde_json::json!({"token": token}))
            .send()
            .await
            .context("Verify request failed")?;
        response.json().await.context("Invalid verify response")
    }

    pub async fn delete_account(&self, token: &str) -> Result<bool> {
        let response = self
            .http
            .delete(self.url("/api/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .context("Delete request failed")?;
        Ok(response.status().is_success())
    }

    pub async fn health(&self) -> Result<HealthPayload> {
        let response = self
            .http
            .get(self.url("/api/health"))
            .send()
            .await
            .context("Health request failed")?;
        response.json().await.context("Invalid health response")
    }

    // ── Collaborator endpoints (bearer-gated) ───────────────────────

    pub async fn contacts(&self, token: &str) -> Result<Vec<Contact>> {
        let response = self
            .http
            .get(self.url("/api/contacts"))
            .bearer_auth(token)
            .send()
            .await
            .context("Contacts request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("Contacts request rejected: {}", response.status());
        }
        response.json().await.context("Invalid contacts response")
    }

    pub async fn create_contact(
        &self,
        token: &str,
        name: &str,
        phone_number: &str,
    ) -> Result<Contact> {
        let response = self
            .http
            .post(self.url("/api/contacts"))
            .bearer_auth(token)
            .json(&serde_json::json!({"name": name, "phone_number": phone_number}))
            .send()
            .await
            .context("Create contact request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("Create contact rejected: {}", response.status());
        }
        response.json().await.context("Invalid contact response")
    }

    pub async fn delete_contact(&self, token: &str, contact_id: &str) -> Result<bool> {
        let response = self
            .http
            .delete(self.url(&format!("/api/contacts/{contact_id}")))
            .bearer_auth(token)
            .send()
            .await
            .context("Delete contact request failed")?;
        Ok(response.status().is_success())
    }

    pub async fn messages(&self, token: &str, contact_id: &str) -> Result<Vec<Message>> {
        let response = self
            .http
            .get(self.url(&format!("/api/contacts/{contact_id}/messages")))
            .bearer_auth(token)
            .send()
            .await
            .context("Messages request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("Messages request rejected: {}", response.status());
        }
        response.json().await.context("Invalid messages response")
    }

    pub async fn send_message(
        &self,
        token: &str,
        contact_id: &str,
        text: &str,
    ) -> Result<Message> {
        let response = self
            .http
            .post(self.url(&format!("/api/contacts/{contact_id}/messages")))
            .bearer_auth(token)
            .json(&serde_json::json!({"text": text}))
            .send()
            .await
            .context("Send message request failed")?;
        if !response.status().is_success() {
            anyhow::bail!("Send message rejected: {}", response.status());
        }
        response.json().await.context("Invalid message response")
    }
}
