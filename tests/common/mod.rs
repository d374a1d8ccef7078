#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use ideadrop::{ServerConfig, cli::DeployMode, create_app, db::Database, jwt::TokenService};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-for-integration-tests";

/// A test app plus handles to its database and token service.
pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub tokens: TokenService,
}

/// A registered user: access token, raw refresh token, and id.
pub struct TestUser {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_mode(DeployMode::Development).await
}

pub async fn create_test_app_with_mode(mode: DeployMode) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let tokens = TokenService::new(TEST_SECRET).expect("Failed to create token service");
    let config = ServerConfig {
        db: db.clone(),
        tokens: tokens.clone(),
        mode,
        allowed_origins: vec!["http://localhost:3000".to_string()],
    };
    TestApp {
        app: create_app(&config),
        db,
        tokens,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Register through the API and return the session.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> TestUser {
        let response = self
            .send(json_request(
                "POST",
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": password }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let refresh_token = refresh_cookie_value(&response).expect("No refresh cookie set");
        let body = body_json(response).await;

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            access_token: body["accessToken"].as_str().unwrap().to_string(),
            refresh_token,
        }
    }

    /// Create an idea as `user` and return its JSON.
    pub async fn create_idea(&self, user: &TestUser, title: &str) -> Value {
        let response = self
            .send(json_request(
                "POST",
                "/api/ideas",
                Some(&user.access_token),
                json!({
                    "title": title,
                    "summary": format!("{} summary", title),
                    "description": format!("{} description", title),
                    "tags": "one, two",
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }
}

pub fn json_request(method: &str, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn refresh_request(refresh_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/auth/refresh");
    if let Some(token) = refresh_token {
        builder = builder.header(header::COOKIE, format!("refreshToken={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Every `Set-Cookie` header on the response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` header for the refresh token, if any.
pub fn refresh_set_cookie(response: &Response<Body>) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with("refreshToken="))
}

/// The refresh token value set by the response, if any.
pub fn refresh_cookie_value(response: &Response<Body>) -> Option<String> {
    let cookie = refresh_set_cookie(response)?;
    let value = cookie.split(';').next()?.strip_prefix("refreshToken=")?;
    Some(value.to_string())
}
