use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Which bearer credential the API hands out and accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    /// Stateless HS256 token in the `Authorization: Bearer` header.
    Jwt,
    /// Server-side session row addressed by an HTTP-only cookie.
    Session,
}

impl FromStr for AuthStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jwt" | "token" => Ok(Self::Jwt),
            "session" | "cookie" => Ok(Self::Session),
            other => anyhow::bail!("unknown AUTH_STRATEGY {other:?}, expected jwt or session"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_minutes: i64,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub strategy: AuthStrategy,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Postgres URL. Without it the service keeps everything in memory.
    pub database_url: Option<String>,
    pub auth: AuthConfig,
    pub weather: WeatherConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let strategy = match std::env::var("AUTH_STRATEGY") {
            Ok(v) => v.parse()?,
            Err(_) => AuthStrategy::Jwt,
        };

        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) => s,
            Err(_) if strategy == AuthStrategy::Session => String::new(),
            Err(e) => return Err(e).context("JWT_SECRET is required when AUTH_STRATEGY=jwt"),
        };

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "skytrack".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "skytrack-users".into()),
            ttl_minutes: checked_ttl(
                "JWT_TTL_MINUTES",
                env_parse("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 7),
            )?,
        };

        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "sid".into()),
            ttl_minutes: checked_ttl(
                "SESSION_TTL_MINUTES",
                env_parse("SESSION_TTL_MINUTES").unwrap_or(60),
            )?,
            secure_cookie: env_parse("SESSION_COOKIE_SECURE").unwrap_or(false),
        };

        let weather = WeatherConfig {
            api_key: std::env::var("WEATHER_API_KEY").context("WEATHER_API_KEY is required")?,
            base_url: std::env::var("WEATHER_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".into()),
            timeout_secs: env_parse("WEATHER_TIMEOUT_SECS").unwrap_or(10),
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT").unwrap_or(5000),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            auth: AuthConfig {
                strategy,
                jwt,
                session,
            },
            weather,
        })
    }
}

/// Credential lifetimes must be positive and at most a year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

fn checked_ttl(key: &str, minutes: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}");
    }
    Ok(minutes)
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
