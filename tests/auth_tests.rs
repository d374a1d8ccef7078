//! Tests for registration, login, refresh, and logout.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_test_app, create_test_app_with_mode, empty_request, json_request,
    refresh_cookie_value, refresh_request, refresh_set_cookie,
};
use ideadrop::cli::DeployMode;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_session_and_cookie() {
    let t = create_test_app().await;

    let response = t
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Alice", "email": "alice@example.com", "password": "hunter22" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = refresh_set_cookie(&response).expect("refresh cookie must be set");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(!cookie.contains("Secure"));

    let refresh_token = refresh_cookie_value(&response).unwrap();
    let body = body_json(response).await;

    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body.get("refreshToken").is_none());

    // Both tokens name the new user
    let user_id = body["user"]["id"].as_str().unwrap();
    let access = t.tokens.verify(body["accessToken"].as_str().unwrap()).unwrap();
    let refresh = t.tokens.verify(&refresh_token).unwrap();
    assert_eq!(access.user_id, user_id);
    assert_eq!(refresh.user_id, user_id);
    assert_eq!(access.exp - access.iat, 60);
    assert_eq!(refresh.exp - refresh.iat, 30 * 24 * 60 * 60);
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let t = create_test_app().await;

    for body in [
        json!({ "email": "alice@example.com", "password": "pw" }),
        json!({ "name": "Alice", "password": "pw" }),
        json!({ "name": "Alice", "email": "alice@example.com" }),
        json!({ "name": "  ", "email": "alice@example.com", "password": "pw" }),
        json!({ "name": "Alice", "email": "alice@example.com", "password": "" }),
        json!({}),
    ] {
        let response = t
            .send(json_request("POST", "/api/auth/register", None, body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(refresh_set_cookie(&response).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"], "All fields are required");
    }
}

#[tokio::test]
async fn test_register_without_body_is_invalid_input() {
    let t = create_test_app().await;

    let response = t.send(empty_request("POST", "/api/auth/register", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let t = create_test_app().await;
    t.register("Alice", "alice@example.com", "hunter22").await;

    let response = t
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Alice Two", "email": "alice@example.com", "password": "other" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["error"], "A user already exists with this email");
}

#[tokio::test]
async fn test_login_success() {
    let t = create_test_app().await;
    let alice = t.register("Alice", "alice@example.com", "hunter22").await;

    let response = t
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "hunter22" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let refresh_token = refresh_cookie_value(&response).expect("refresh cookie must be set");
    assert_eq!(t.tokens.verify(&refresh_token).unwrap().user_id, alice.id);

    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], alice.id.as_str());
    let claims = t.tokens.verify(body["accessToken"].as_str().unwrap()).unwrap();
    assert_eq!(claims.user_id, alice.id);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let t = create_test_app().await;
    t.register("Alice", "alice@example.com", "hunter22").await;

    let wrong_password = t
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "wrong" }),
        ))
        .await;
    let unknown_email = t
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": "hunter22" }),
        ))
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), wrong_password.status());
    assert!(refresh_set_cookie(&wrong_password).is_none());
    assert!(refresh_set_cookie(&unknown_email).is_none());

    let wrong_password = body_json(wrong_password).await;
    let unknown_email = body_json(unknown_email).await;
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let t = create_test_app().await;

    for body in [
        json!({ "email": "alice@example.com" }),
        json!({ "password": "hunter22" }),
        json!({ "email": "", "password": "hunter22" }),
    ] {
        let response = t.send(json_request("POST", "/api/auth/login", None, body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Email and password are required");
    }
}

#[tokio::test]
async fn test_refresh_after_register() {
    let t = create_test_app().await;
    let alice = t.register("Alice", "alice@example.com", "hunter22").await;

    let response = t.send(refresh_request(Some(&alice.refresh_token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The refresh token is not rotated
    assert!(refresh_set_cookie(&response).is_none());

    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], alice.id.as_str());
    assert_eq!(body["user"]["email"], "alice@example.com");

    let claims = t.tokens.verify(body["accessToken"].as_str().unwrap()).unwrap();
    assert_eq!(claims.user_id, alice.id);
    assert_eq!(claims.exp - claims.iat, 60);
}

#[tokio::test]
async fn test_refresh_without_cookie_is_unauthenticated() {
    let t = create_test_app().await;

    let response = t.send(refresh_request(None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "No refresh token");
}

#[tokio::test]
async fn test_refresh_with_invalid_token_is_unauthenticated() {
    let t = create_test_app().await;

    let response = t.send(refresh_request(Some("not-a-jwt"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_foreign_signature_is_unauthenticated() {
    let t = create_test_app().await;
    let alice = t.register("Alice", "alice@example.com", "hunter22").await;

    let other = ideadrop::jwt::TokenService::new(b"some-other-secret-entirely").unwrap();
    let forged = other
        .issue(&alice.id, ideadrop::jwt::REFRESH_TOKEN_TTL)
        .unwrap();

    let response = t.send(refresh_request(Some(&forged.token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_expired_token_is_unauthenticated() {
    let t = create_test_app().await;
    let alice = t.register("Alice", "alice@example.com", "hunter22").await;

    // Issued 31 days ago with a 30 day lifetime
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let expired = t
        .tokens
        .issue_at(&alice.id, ideadrop::jwt::REFRESH_TOKEN_TTL, now - 31 * 24 * 60 * 60)
        .unwrap();

    let response = t.send(refresh_request(Some(&expired.token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_for_deleted_user_is_unauthenticated() {
    let t = create_test_app().await;
    let alice = t.register("Alice", "alice@example.com", "hunter22").await;
    t.db.users().delete(&alice.id).await.unwrap();

    let response = t.send(refresh_request(Some(&alice.refresh_token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "No user exists");
}

#[tokio::test]
async fn test_logout_clears_cookie_then_refresh_fails() {
    let t = create_test_app().await;
    t.register("Alice", "alice@example.com", "hunter22").await;

    let response = t.send(empty_request("POST", "/api/auth/logout", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = refresh_set_cookie(&response).expect("logout must clear the cookie");
    assert!(cleared.starts_with("refreshToken=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert!(cleared.contains("HttpOnly"));
    assert!(cleared.contains("SameSite=Lax"));

    let body = body_json(response).await;
    assert_eq!(body["message"], "Logged out successfully");

    // Client no longer has the cookie
    let response = t.send(refresh_request(None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_does_not_revoke_existing_refresh_token() {
    let t = create_test_app().await;
    let alice = t.register("Alice", "alice@example.com", "hunter22").await;

    t.send(empty_request("POST", "/api/auth/logout", None)).await;

    // A copy kept by the client still works until it expires
    let response = t.send(refresh_request(Some(&alice.refresh_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_production_cookie_attributes_match_on_set_and_clear() {
    let t = create_test_app_with_mode(DeployMode::Production).await;
    let response = t
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Alice", "email": "alice@example.com", "password": "hunter22" }),
        ))
        .await;
    let set = refresh_set_cookie(&response).unwrap();
    assert!(set.contains("HttpOnly"));
    assert!(set.contains("Secure"));
    assert!(set.contains("SameSite=None"));

    let response = t.send(empty_request("POST", "/api/auth/logout", None)).await;
    let cleared = refresh_set_cookie(&response).unwrap();
    assert!(cleared.contains("HttpOnly"));
    assert!(cleared.contains("Secure"));
    assert!(cleared.contains("SameSite=None"));
    assert!(cleared.contains("Path=/"));
}
