use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::{
        repo::{MemoryUserRepository, PgUserRepository, UserRepository},
        session::{MemorySessionRepository, PgSessionRepository, SessionRepository},
    },
    config::AppConfig,
    db,
    locations::repo::{LocationRepository, MemoryLocationRepository, PgLocationRepository},
    weather::WeatherClient,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub weather: WeatherClient,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Postgres-backed when `DATABASE_URL` is set, in-memory otherwise.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let Some(url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
            return Self::in_memory(config);
        };

        let pool = db::connect(&url).await?;
        db::migrate(&pool).await;
        info!("connected to postgres");

        Ok(Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            locations: Arc::new(PgLocationRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool)),
            weather: WeatherClient::new(&config.weather)?,
            config: Arc::new(config),
        })
    }

    pub fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            users: Arc::new(MemoryUserRepository::default()),
            locations: Arc::new(MemoryLocationRepository::default()),
            sessions: Arc::new(MemorySessionRepository::default()),
            weather: WeatherClient::new(&config.weather)?,
            config: Arc::new(config),
        })
    }
}
