pub mod client;
mod dto;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub use client::WeatherClient;

pub fn router() -> Router<AppState> {
    handlers::weather_routes()
}
