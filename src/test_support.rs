//! Shared fixtures for the HTTP-level tests.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use crate::{
    app::build_app,
    config::{AppConfig, AuthConfig, AuthStrategy, JwtConfig, SessionConfig, WeatherConfig},
    state::AppState,
};

/// Nothing listens here, so weather calls fail fast unless a test points elsewhere.
pub const UNREACHABLE_WEATHER: &str = "http://127.0.0.1:9";

pub fn test_config(strategy: AuthStrategy, weather_base_url: &str) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: None,
        auth: AuthConfig {
            strategy,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "skytrack".into(),
                audience: "skytrack-users".into(),
                ttl_minutes: 60,
            },
            session: SessionConfig {
                cookie_name: "sid".into(),
                ttl_minutes: 60,
                secure_cookie: false,
            },
        },
        weather: WeatherConfig {
            api_key: "test-key".into(),
            base_url: weather_base_url.into(),
            timeout_secs: 2,
        },
    }
}

pub fn test_server(strategy: AuthStrategy) -> TestServer {
    test_server_with_weather(strategy, UNREACHABLE_WEATHER)
}

pub fn test_server_with_weather(strategy: AuthStrategy, weather_base_url: &str) -> TestServer {
    test_app(test_config(strategy, weather_base_url)).0
}

/// Server plus a handle on its state, for tests that inspect the stores directly.
pub fn test_app(config: AppConfig) -> (TestServer, AppState) {
    let state = AppState::in_memory(config).unwrap();
    let server = TestServer::new(build_app(state.clone())).unwrap();
    (server, state)
}

pub fn ann() -> Value {
    json!({ "name": "Ann Lee", "email": "ann@example.com", "password": "secret1" })
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

/// Registers `user` on a JWT server and returns its token.
pub async fn register(server: &TestServer, user: &Value) -> String {
    let res = server.post("/api/auth/register").json(user).await;
    res.assert_status(StatusCode::CREATED);
    res.json::<Value>()["token"].as_str().unwrap().to_string()
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let res = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    res.assert_status_ok();
    res.json::<Value>()["token"].as_str().unwrap().to_string()
}
