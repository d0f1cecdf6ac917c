/// Integration tests for the authentication gate
///
/// Drive a small router through `require_auth` with an in-memory credential
/// store. No database required.

use std::sync::{Arc, Mutex};

use axum::{
    async_trait,
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use chrono::Duration;
use cobranca_shared::auth::jwt::TokenService;
use cobranca_shared::auth::middleware::{require_auth, AuthContext, AuthGate};
use cobranca_shared::models::user::{CreateUser, CredentialStore, UpdateUser, User};
use tower::ServiceExt;

const SECRET: &str = "gate-test-secret-key-at-least-32-bytes";

struct MemoryStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, _data: CreateUser) -> Result<User, sqlx::Error> {
        unimplemented!("not used by the gate")
    }

    async fn update(&self, _id: i32, _data: UpdateUser) -> Result<Option<User>, sqlx::Error> {
        unimplemented!("not used by the gate")
    }
}

fn app(tokens: Arc<TokenService>) -> Router {
    let store = MemoryStore {
        users: Mutex::new(vec![User {
            id: 1,
            name: "Joana".to_string(),
            email: "joana@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            national_id: None,
            phone: None,
        }]),
    };
    let gate = AuthGate::new(tokens, Arc::new(store));

    Router::new()
        .route(
            "/whoami",
            get(|auth: AuthContext| async move { format!("{}:{}", auth.user_id(), auth.user.email) }),
        )
        .layer(middleware::from_fn_with_state(gate, require_auth))
}

fn tokens() -> Arc<TokenService> {
    Arc::new(TokenService::new(SECRET, Duration::hours(8)))
}

fn request(authorization: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri("/whoami");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let tokens = tokens();
    let token = tokens.issue(1).unwrap();

    let response = app(tokens)
        .oneshot(request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "1:joana@example.com");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let response = app(tokens()).oneshot(request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["erro"], "unauthorized");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let tokens = tokens();
    let token = tokens.issue_with_ttl(1, Duration::seconds(-1)).unwrap();

    let response = app(tokens)
        .oneshot(request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["mensagem"], "Token expirado.");
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let tokens = tokens();
    let token = tokens.issue(404).unwrap();

    let response = app(tokens)
        .oneshot(request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_response_never_contains_password_hash() {
    let tokens = tokens();
    let token = tokens.issue(1).unwrap();

    let response = app(tokens)
        .oneshot(request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();

    assert!(!body_string(response).await.contains("argon2"));
}
