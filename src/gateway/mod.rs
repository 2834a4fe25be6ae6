//! Axum-based HTTP gateway for the identity core and its collaborators.
//!
//! The gateway keeps handlers thin: every auth decision lives in
//! [`AuthService`], and every protected collaborator route (contacts,
//! messages) passes through the one reusable
//! [`require_authenticated_subject`] gate before touching the store.
//!
//! Middleware:
//! - Request body size limit (64KB)
//! - Request timeout (30s) to prevent slow-loris abuse
//! - CORS for browser/desktop clients

use crate::auth::{AuthError, AuthService, UserProfile};
use crate::config::Config;
use crate::store::Database;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub db: Arc<Database>,
}

/// Standard handler response: status + JSON body.
type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Run the HTTP gateway until a termination signal arrives, then release
/// the store connection before returning.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let display_addr = format!("{host}:{}", listener.local_addr()?.port());

    let db = Arc::new(Database::new(config.database_path()?));
    let tokens = crate::auth::TokenService::new(&config.signing_secret(), config.auth.token_ttl_days);
    let auth = Arc::new(AuthService::new(
        db.clone(),
        tokens,
        config.auth.min_password_len,
    ));
    let state = AppState {
        auth,
        db: db.clone(),
    };

    let app = build_router(state);

    tracing::info!("Gateway listening on http://{display_addr}");
    println!("🧵 threadline gateway on http://{display_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release the store connection on every exit path
    db.close().await;
    tracing::info!("Gateway stopped");
    Ok(())
}

/// Resolve on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Build the route table with middleware. Split out so tests can drive the
/// router in-process.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/auth/signup", post(handle_signup))
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/verify", post(handle_verify))
        .route("/api/auth/me", get(handle_me))
        .route("/api/auth/me", delete(handle_delete_me))
        .route("/api/contacts", get(handle_contacts_list))
        .route("/api/contacts", post(handle_contact_create))
        .route("/api/contacts/{id}", delete(handle_contact_delete))
        .route("/api/contacts/{id}/messages", get(handle_messages_list))
        .route("/api/contacts/{id}/messages", post(handle_message_send))
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// The single reusable gate for protected routes: resolve the bearer token
/// to a live subject or produce the error response.
async fn require_authenticated_subject(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<UserProfile, ApiResponse> {
    let token = extract_bearer_token(headers).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Missing Authorization header"})),
        )
    })?;

    state.auth.verify_token(token).await.map_err(auth_failure)
}

/// Map an auth failure to its wire shape.
fn auth_failure(e: AuthError) -> ApiResponse {
    (
        e.status_code(),
        Json(serde_json::json!({"success": false, "error": e.to_string()})),
    )
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// Request body for signup.
#[derive(Deserialize)]
struct SignupBody {
    email: String,
    fullname: String,
    password: String,
}

/// Request body for login.
#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

/// Request body for token verification.
#[derive(Deserialize)]
struct VerifyBody {
    token: String,
}

/// Request body for contact creation.
#[derive(Deserialize)]
struct ContactBody {
    name: String,
    phone_number: String,
}

/// Request body for sending a message.
#[derive(Deserialize)]
struct MessageBody {
    text: String,
}

/// GET /api/health — store connectivity report; never fails the process.
async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let connected = state.db.health_check().await;
    let users = if connected {
        match state.db.acquire().await {
            Ok(store) => store.user_count().unwrap_or(0),
            Err(_) => 0,
        }
    } else {
        0
    };

    Json(serde_json::json!({
        "status": "ok",
        "database": if connected { "connected" } else { "disconnected" },
        "users": users,
        "timestamp": epoch_secs(),
    }))
}

/// POST /api/auth/signup — create an account, return its first token.
async fn handle_signup(
    State(state): State<AppState>,
    body: Result<Json<SignupBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"success": false, "error": format!("Invalid request: {e}")})),
            );
        }
    };

    match state
        .auth
        .signup(&body.email, &body.fullname, &body.password)
        .await
    {
        Ok((token, user)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "token": token,
                "user": user,
            })),
        ),
        Err(e) => auth_failure(e),
    }
}

/// POST /api/auth/login — authenticate and get a session token.
async fn handle_login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"success": false, "error": format!("Invalid request: {e}")})),
            );
        }
    };

    match state.auth.login(&body.email, &body.password).await {
        Ok((token, user)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "token": token,
                "user": user,
            })),
        ),
        Err(e) => auth_failure(e),
    }
}

/// POST /api/auth/verify — authoritative token check.
async fn handle_verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"success": false, "error": format!("Invalid request: {e}")})),
            );
        }
    };

    match state.auth.verify_token(&body.token).await {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "user": user})),
        ),
        Err(e) => auth_failure(e),
    }
}

/// GET /api/auth/me — current user info from the bearer token.
async fn handle_me(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    match require_authenticated_subject(&state, &headers).await {
        Ok(user) => (StatusCode::OK, Json(serde_json::json!({"user": user}))),
        Err(resp) => resp,
    }
}

/// DELETE /api/auth/me — delete the authenticated account and everything
/// it owns.
async fn handle_delete_me(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let token = match extract_bearer_token(&headers) {
        Some(t) => t.to_string(),
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "Missing Authorization header"})),
            );
        }
    };

    match state.auth.delete_account(&token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "message": "Account deleted"})),
        ),
        Err(e) => auth_failure(e),
    }
}

/// GET /api/contacts — list the authenticated user's contacts.
async fn handle_contacts_list(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let user = match require_authenticated_subject(&state, &headers).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match store_op(&state, |s| s.list_contacts(&user.id)).await {
        Ok(contacts) => (StatusCode::OK, Json(serde_json::json!(contacts))),
        Err(resp) => resp,
    }
}

/// POST /api/contacts — add a contact.
async fn handle_contact_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ContactBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let user = match require_authenticated_subject(&state, &headers).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"success": false, "error": format!("Invalid request: {e}")})),
            );
        }
    };
    let name = body.name.trim();
    let phone = body.phone_number.trim();
    if name.is_empty() || phone.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"success": false, "error": "Name and phone number are required"})),
        );
    }

    match store_op(&state, |s| s.create_contact(&user.id, name, phone)).await {
        Ok(contact) => (StatusCode::CREATED, Json(serde_json::json!(contact))),
        Err(resp) => resp,
    }
}

/// DELETE /api/contacts/{id} — remove a contact and its thread.
async fn handle_contact_delete(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    let user = match require_authenticated_subject(&state, &headers).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match store_op(&state, |s| s.delete_contact(&user.id, &contact_id)).await {
        Ok(true) => (StatusCode::OK, Json(serde_json::json!({"success": true}))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"success": false, "error": "Contact not found"})),
        ),
        Err(resp) => resp,
    }
}

/// GET /api/contacts/{id}/messages — a contact's thread, oldest first.
async fn handle_messages_list(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    let user = match require_authenticated_subject(&state, &headers).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match store_op(&state, |s| s.list_messages(&user.id, &contact_id)).await {
        Ok(Some(messages)) => (StatusCode::OK, Json(serde_json::json!(messages))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"success": false, "error": "Contact not found"})),
        ),
        Err(resp) => resp,
    }
}

/// POST /api/contacts/{id}/messages — append a message to a thread.
async fn handle_message_send(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<MessageBody>, axum::extract::rejection::JsonRejection>,
) -> ApiResponse {
    let user = match require_authenticated_subject(&state, &headers).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"success": false, "error": format!("Invalid request: {e}")})),
            );
        }
    };
    if body.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"success": false, "error": "Message text is required"})),
        );
    }

    match store_op(&state, |s| {
        s.append_message(&user.id, &contact_id, body.text.trim(), "user")
    })
    .await
    {
        Ok(Some(message)) => (StatusCode::CREATED, Json(serde_json::json!(message))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"success": false, "error": "Contact not found"})),
        ),
        Err(resp) => resp,
    }
}

/// Acquire the store and run one operation, mapping store failures to wire
/// responses (unavailable stays distinct from any auth verdict).
async fn store_op<T>(
    state: &AppState,
    op: impl FnOnce(&crate::store::UserStore) -> Result<T, crate::store::StoreError>,
) -> Result<T, ApiResponse> {
    let store = state.db.acquire().await.map_err(|e| {
        tracing::error!("Store unavailable: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"success": false, "error": "Service temporarily unavailable"})),
        )
    })?;

    op(&store).map_err(|e| {
        tracing::error!("Store operation failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"success": false, "error": "Internal server error"})),
        )
    })
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(tmp: &tempfile::TempDir) -> Router {
        let db = Arc::new(Database::new(tmp.path().join("threadline.db")));
        let auth = Arc::new(AuthService::new(
            db.clone(),
            TokenService::new("test-secret", 7),
            6,
        ));
        build_router(AppState { auth, db })
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn signup(app: &Router, email: &str, fullname: &str, password: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({
                "email": email, "fullname": fullname, "password": password
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn signup_returns_token_and_user() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com", "fullname": "Alice", "password": "secret1"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], "alice@example.com");
        assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        signup(&app, "alice@example.com", "Alice", "secret1").await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({
                "email": "ALICE@example.com", "fullname": "Alice", "password": "secret2"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        let (status, _) = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com", "fullname": "Alice", "password": "12345"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_failures_are_observably_identical() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        signup(&app, "alice@example.com", "Alice", "secret1").await;

        let wrong_password = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({"email": "alice@example.com", "password": "wrong66"})),
        )
        .await;
        let unknown_email = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({"email": "ghost@example.com", "password": "secret1"})),
        )
        .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        // Same status code AND same body for both failure modes
        assert_eq!(wrong_password, unknown_email);
    }

    #[tokio::test]
    async fn verify_accepts_valid_and_rejects_garbage() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        let token = signup(&app, "alice@example.com", "Alice", "secret1").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/verify",
            None,
            Some(serde_json::json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], "alice@example.com");

        let (status, _) = call(
            &app,
            "POST",
            "/api/auth/verify",
            None,
            Some(serde_json::json!({"token": "a.b.c"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        let (status, _) = call(&app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = signup(&app, "alice@example.com", "Alice", "secret1").await;
        let (status, body) = call(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["fullname"], "Alice");
    }

    #[tokio::test]
    async fn health_reports_connected_store() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        let (status, body) = call(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn contacts_require_authentication() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        let (status, _) = call(&app, "GET", "/api/contacts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn contacts_and_messages_flow() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);
        let token = signup(&app, "alice@example.com", "Alice", "secret1").await;

        let (status, contact) = call(
            &app,
            "POST",
            "/api/contacts",
            Some(&token),
            Some(serde_json::json!({"name": "Bob", "phone_number": "+46701234567"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let contact_id = contact["id"].as_str().unwrap().to_string();

        let (status, contacts) = call(&app, "GET", "/api/contacts", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(contacts.as_array().unwrap().len(), 1);

        let uri = format!("/api/contacts/{contact_id}/messages");
        let (status, message) = call(
            &app,
            "POST",
            &uri,
            Some(&token),
            Some(serde_json::json!({"text": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(message["sent_by"], "user");

        let (status, thread) = call(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(thread.as_array().unwrap().len(), 1);
        assert_eq!(thread[0]["text"], "hello");

        let (status, _) = call(
            &app,
            "DELETE",
            &format!("/api/contacts/{contact_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn end_to_end_account_lifecycle() {
        let tmp = tempfile::TempDir::new().unwrap();
        let app = test_app(&tmp);

        // signup → 201 with token
        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com", "fullname": "Alice", "password": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        // login with case-folded email → 200 with token
        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({"email": "ALICE@example.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        // verify → valid, subject = alice's id
        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/verify",
            None,
            Some(serde_json::json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user_id.as_str());

        // delete account → subsequent verify of the same token fails
        let (status, _) = call(&app, "DELETE", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            "POST",
            "/api/auth/verify",
            None,
            Some(serde_json::json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
