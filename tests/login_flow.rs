mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};

use common::{bearer, spawn_app};

#[tokio::test]
async fn login_issues_a_three_part_token() {
    let app = spawn_app();
    let res = app.login("user", "password").await;

    assert_eq!(res.status, StatusCode::OK);
    let token = res.json()["jwtToken"].as_str().unwrap().to_string();
    assert_eq!(token.matches('.').count(), 2);
    assert_eq!(app.successful_logins(), 1);
    assert_eq!(app.failed_logins(), 0);
}

#[tokio::test]
async fn bad_credentials_are_401_and_counted() {
    let app = spawn_app();

    for (user, pass) in [("user", "wrong"), ("nobody", "password")] {
        let res = app.login(user, pass).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);

        let body = res.json();
        assert_eq!(body["status"], 401);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(
            body["message"],
            "Authentication failed: Invalid credentials provided."
        );
        assert_eq!(body["path"], "/auth/login");
        assert!(body["timestamp"].as_str().is_some());
    }

    assert_eq!(app.failed_logins(), 2);
    assert_eq!(app.successful_logins(), 0);
}

#[tokio::test]
async fn malformed_login_body_is_400() {
    let app = spawn_app();
    let res = app.login_raw("{\"username\": \"user\"").await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["path"], "/auth/login");
    assert_eq!(app.failed_logins(), 0);
}

#[tokio::test]
async fn token_opens_secure_data() {
    let app = spawn_app();
    let token = app.token().await;

    let res = app.get("/api/secure/data", bearer(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json()["message"],
        "This is SECURE data for user: user. You should only see this if you are authenticated."
    );
    assert_eq!(
        app.state
            .metrics
            .secure_requests("/api/secure/data")
            .get(),
        1
    );
}

#[tokio::test]
async fn missing_token_is_401_with_structured_body() {
    let app = spawn_app();
    let res = app.get("/api/secure/data", None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    let body = res.json();
    assert_eq!(body["status"], 401);
    assert_eq!(body["path"], "/api/secure/data");
    assert!(res.headers.get("www-authenticate").is_none());
    assert_eq!(app.failed_logins(), 0);
}

#[tokio::test]
async fn user_without_admin_role_is_403() {
    let app = spawn_app();
    let token = app.token().await;

    let res = app.get("/api/secure/admin", bearer(&token)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let body = res.json();
    assert_eq!(body["status"], 403);
    assert_eq!(body["error"], "Forbidden");
    assert_eq!(body["path"], "/api/secure/admin");
}

#[tokio::test]
async fn expired_token_is_rejected_and_counted_once() {
    let app = spawn_app();
    let token = app
        .state
        .tokens
        .issue_at("user", ["ROLE_USER"], Utc::now() - Duration::hours(2))
        .unwrap();

    let res = app.get("/api/secure/data", bearer(&token)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.failed_logins(), 1);
}

#[tokio::test]
async fn garbage_token_is_401_not_500() {
    let app = spawn_app();
    let res = app.get("/api/secure/data", bearer("definitely.not.ajwt")).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.failed_logins(), 1);
}

#[tokio::test]
async fn public_info_needs_no_token() {
    let app = spawn_app();
    let res = app.get("/api/public/info", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.json()["message"],
        "This is PUBLIC information. Anyone can see this."
    );
}

#[tokio::test]
async fn unknown_paths_authenticate_before_404() {
    let app = spawn_app();
    let anonymous = app.get("/api/nope", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let token = app.token().await;
    let res = app.get("/api/nope", bearer(&token)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["path"], "/api/nope");
}

#[tokio::test]
async fn chaos_route_is_absent_by_default() {
    let app = spawn_app();
    let token = app.token().await;
    let res = app.get("/demo/flaky-request", bearer(&token)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = spawn_app();
    let res = app.get("/api/public/info", None).await;
    assert!(res.headers.get("x-request-id").is_some());
}
