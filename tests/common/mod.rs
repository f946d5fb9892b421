#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tower::ServiceExt;

use resource_server::app::build_router;
use resource_server::config::{AppEnv, Config, LogFormat, ManagementUserConfig, PasswordHashConfig};
use resource_server::services::audit::{AuditRecord, AuditSink};
use resource_server::state::AppState;

pub const SECRET: &str = "test-secret-test-secret-test-secret-0123";
pub const ACTUATOR_USER: &str = "ops";
pub const ACTUATOR_PASSWORD: &str = "ops-password";

#[derive(Default)]
pub struct CapturingSink(Mutex<Vec<AuditRecord>>);

impl CapturingSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.0.lock().unwrap().clone()
    }
}

impl AuditSink for CapturingSink {
    fn emit(&self, record: &AuditRecord) {
        self.0.lock().unwrap().push(record.clone());
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub audit: Arc<CapturingSink>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        app_env: AppEnv::Development,
        log_format: LogFormat::Text,
        jwt_secret_key: SECRET.to_string(),
        jwt_validity_seconds: 3600,
        management_user: ManagementUserConfig {
            username: ACTUATOR_USER.to_string(),
            password: ACTUATOR_PASSWORD.to_string(),
            roles: "ACTUATOR_ADMIN".to_string(),
        },
        password_hash: PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
        },
        chaos_enabled: false,
    }
}

pub fn spawn_app() -> TestApp {
    let config = test_config();
    let audit = Arc::new(CapturingSink::default());
    let state = AppState::from_config(&config, audit.clone()).unwrap();
    let router = build_router(state.clone(), &config);
    TestApp {
        router,
        state,
        audit,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, auth: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn login_raw(&self, body: &str) -> TestResponse {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({ "username": username, "password": password });
        self.login_raw(&body.to_string()).await
    }

    pub async fn token(&self) -> String {
        let res = self.login("user", "password").await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.text());
        res.json()["jwtToken"].as_str().unwrap().to_string()
    }

    pub fn failed_logins(&self) -> u64 {
        self.state.metrics.failed_logins().get()
    }

    pub fn successful_logins(&self) -> u64 {
        self.state.metrics.successful_logins().get()
    }
}

pub fn bearer(token: &str) -> Option<String> {
    Some(format!("Bearer {token}"))
}

pub fn basic(username: &str, password: &str) -> Option<String> {
    Some(format!(
        "Basic {}",
        STANDARD.encode(format!("{username}:{password}"))
    ))
}

pub fn with_peer(mut req: Request<Body>, addr: &str) -> Request<Body> {
    let addr: SocketAddr = addr.parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}
