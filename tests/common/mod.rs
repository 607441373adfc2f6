#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use cities_manager::auth::{REFRESH_TOKEN_HEADER, UserDirectory};
use cities_manager::config::AuthSettings;
use cities_manager::jwt::{TokenCodec, TokenSubject, now_secs};
use cities_manager::{ServerConfig, create_app, db::Database};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "hunter22";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub settings: AuthSettings,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_settings() -> AuthSettings {
    AuthSettings::new(
        b"test-jwt-secret-that-is-long-enough-0123".to_vec(),
        "cities-api",
        "cities-clients",
        10,
        60,
    )
    .expect("Invalid test settings")
}

pub async fn create_test_app() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let settings = test_settings();
    let config = ServerConfig {
        db: db.clone(),
        auth: settings.clone(),
    };
    TestApp {
        app: create_app(&config),
        db,
        settings,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(json_request("POST", uri, body)).await
    }

    /// Register a user and return the session body.
    pub async fn register(&self, email: &str) -> Value {
        let response = self
            .post_json(
                "/api/account/register",
                json!({
                    "display_name": "Test User",
                    "email": email,
                    "phone_number": "5550100",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Mint an access token for a registered user with an arbitrary expiry.
    pub async fn access_token_expiring_at(&self, email: &str, expires_at: u64) -> String {
        let user = self
            .db
            .users()
            .find_by_email(email)
            .await
            .unwrap()
            .expect("user not registered");
        TokenCodec::new(&self.settings)
            .encode(
                TokenSubject {
                    user_id: &user.user_id,
                    email: &user.email,
                    display_name: &user.display_name,
                },
                expires_at,
            )
            .unwrap()
    }

    /// Access token that expired a minute ago.
    pub async fn expired_access_token(&self, email: &str) -> String {
        self.access_token_expiring_at(email, now() - 60).await
    }
}

pub fn now() -> u64 {
    now_secs().unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a request carrying both credential headers, as protected routes require.
pub fn authed_request(
    method: &str,
    uri: &str,
    access: &str,
    refresh: &str,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", access))
        .header(REFRESH_TOKEN_HEADER, refresh);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing {} in {}", field, body))
}
