//! Integration tests for `HttpIdentityClient` against a real local HTTP
//! server.
//!
//! Each test spins up an axum app on `127.0.0.1:0` that plays the identity
//! authority, so requests, headers, and status codes go over an actual
//! socket.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use warden_identity::{
    HttpIdentityClient, IdentityClient, IdentityConfig, IdentityError, LoginExchange,
};
use warden_protocol::{Credentials, UserId};

const GOOD_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiI3In0.c2ln";

// =========================================================================
// Fake authority
// =========================================================================

fn user_json() -> Value {
    json!({
        "id": 7,
        "email": "ada@example.com",
        "username": "ada",
        "full_name": "Ada Lovelace",
        "is_active": true,
        "is_superuser": false,
        "roles": ["operator"],
        "created_at": "2024-01-05T09:30:00",
        "last_login": "2024-06-01T08:00:00+00:00"
    })
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth == format!("Bearer {GOOD_TOKEN}") {
        Ok(Json(user_json()))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn login(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["email"] == "ada@example.com" && body["password"] == "correct horse" {
        Ok(Json(json!({ "access_token": GOOD_TOKEN, "user": user_json() })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn garbled() -> &'static str {
    "definitely not json"
}

async fn down() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(user_json())
}

/// Starts the fake authority on a random port and returns its origin.
async fn start_authority() -> String {
    let app = Router::new()
        .route("/api/users/me", get(me))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/slow/users/me", get(slow))
        .route("/broken/users/me", get(garbled))
        .route("/broken/auth/login", post(down));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{addr}")
}

fn client_for(base_url: String) -> HttpIdentityClient {
    HttpIdentityClient::new(&IdentityConfig {
        base_url,
        request_timeout: Duration::from_secs(5),
        ..IdentityConfig::default()
    })
    .expect("config should be valid")
}

// =========================================================================
// fetch_current_user()
// =========================================================================

#[tokio::test]
async fn test_fetch_current_user_valid_token_returns_user() {
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/api"));

    let user = client.fetch_current_user(GOOD_TOKEN).await.unwrap();

    assert_eq!(user.id, UserId(7));
    assert_eq!(user.email, "ada@example.com");
    assert!(user.has_role("operator"));
}

#[tokio::test]
async fn test_fetch_current_user_revoked_token_returns_unauthorized() {
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/api"));

    let result = client.fetch_current_user("revoked.token.sig").await;

    assert_eq!(result, Err(IdentityError::Unauthorized { status: 401 }));
}

#[tokio::test]
async fn test_fetch_current_user_unknown_path_returns_unauthorized() {
    // Any non-success status counts as a rejection, 404 included.
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/nowhere"));

    let result = client.fetch_current_user(GOOD_TOKEN).await;

    assert_eq!(result, Err(IdentityError::Unauthorized { status: 404 }));
}

#[tokio::test]
async fn test_fetch_current_user_garbled_body_returns_unreachable() {
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/broken"));

    let result = client.fetch_current_user(GOOD_TOKEN).await;

    assert!(matches!(result, Err(IdentityError::Unreachable(_))));
}

#[tokio::test]
async fn test_fetch_current_user_timeout_returns_unreachable() {
    let origin = start_authority().await;
    let client = HttpIdentityClient::new(&IdentityConfig {
        base_url: format!("{origin}/slow"),
        request_timeout: Duration::from_millis(200),
        ..IdentityConfig::default()
    })
    .unwrap();

    let result = client.fetch_current_user(GOOD_TOKEN).await;

    assert_eq!(
        result,
        Err(IdentityError::Unreachable("request timed out".to_string()))
    );
}

#[tokio::test]
async fn test_fetch_current_user_no_server_returns_unreachable() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(format!("http://{addr}"));

    let result = client.fetch_current_user(GOOD_TOKEN).await;

    assert!(matches!(result, Err(IdentityError::Unreachable(_))));
}

// =========================================================================
// refresh_current_user()
// =========================================================================

#[tokio::test]
async fn test_refresh_current_user_uses_refresh_path() {
    let origin = start_authority().await;
    let client = HttpIdentityClient::new(&IdentityConfig {
        base_url: format!("{origin}/api"),
        me_path: "/nowhere".to_string(),
        refresh_path: Some("/auth/me".to_string()),
        request_timeout: Duration::from_secs(5),
        ..IdentityConfig::default()
    })
    .unwrap();

    let refreshed = client.refresh_current_user(GOOD_TOKEN).await.unwrap();
    let looked_up = client.fetch_current_user(GOOD_TOKEN).await;

    assert_eq!(refreshed.id, UserId(7));
    assert_eq!(looked_up, Err(IdentityError::Unauthorized { status: 404 }));
}

#[tokio::test]
async fn test_refresh_current_user_defaults_to_me_path() {
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/api"));

    assert_eq!(client.refresh_url(), client.me_url());
    let user = client.refresh_current_user(GOOD_TOKEN).await.unwrap();
    assert_eq!(user.id, UserId(7));
}

// =========================================================================
// exchange()
// =========================================================================

#[tokio::test]
async fn test_exchange_correct_credentials_returns_grant() {
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/api"));

    let grant = client
        .exchange(&Credentials::new("ada@example.com", "correct horse"))
        .await
        .unwrap();

    assert_eq!(grant.token, GOOD_TOKEN);
    assert_eq!(grant.user.id, UserId(7));
}

#[tokio::test]
async fn test_exchange_wrong_password_returns_unauthorized() {
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/api"));

    let result = client
        .exchange(&Credentials::new("ada@example.com", "battery staple"))
        .await;

    assert!(matches!(result, Err(ref e) if e.is_rejection()));
}

#[tokio::test]
async fn test_exchange_server_error_returns_unreachable() {
    // A 5xx is the authority failing, not the credentials being wrong.
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/broken"));

    let result = client
        .exchange(&Credentials::new("ada@example.com", "correct horse"))
        .await;

    assert!(matches!(result, Err(IdentityError::Unreachable(_))));
}

#[tokio::test]
async fn test_exchange_grant_token_fetches_same_user() {
    let origin = start_authority().await;
    let client = client_for(format!("{origin}/api"));

    let grant = client
        .exchange(&Credentials::new("ada@example.com", "correct horse"))
        .await
        .unwrap();
    let user = client.fetch_current_user(&grant.token).await.unwrap();

    assert_eq!(user, grant.user);
}
