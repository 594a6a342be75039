use std::time::Duration;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod locations;
mod responses;
mod state;
mod validation;
mod weather;

#[cfg(test)]
mod test_support;

use crate::{config::AuthStrategy, state::AppState};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "skytrack=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = config::AppConfig::from_env()?;
    let (host, port) = (config.host.clone(), config.port);
    tracing::info!(strategy = ?config.auth.strategy, "auth strategy selected");

    let app_state = AppState::init(config).await?;

    if app_state.config.auth.strategy == AuthStrategy::Session {
        spawn_session_sweeper(app_state.clone());
    }

    app::serve(app::build_app(app_state), &host, port).await
}

/// Periodically drops expired session rows; lookups reject them regardless.
fn spawn_session_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match state.sessions.delete_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(removed = n, "expired sessions swept"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });
}
