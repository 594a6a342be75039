use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    config::WeatherConfig,
    error::AppError,
    weather::dto::{CurrentWeather, Forecast, OwmCurrent, OwmForecast},
};

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("city not found")]
    CityNotFound,

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider answered {0}")]
    Status(StatusCode),

    #[error("unreadable provider payload: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::CityNotFound => AppError::NotFound("City not found".into()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Thin client for the OpenWeatherMap 2.5 API. Stateless: nothing is cached or retried.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(cfg: &WeatherConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build weather http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    pub async fn current(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        let raw: OwmCurrent = self.fetch("weather", city).await?;
        Ok(raw.into())
    }

    pub async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError> {
        let raw: OwmForecast = self.fetch("forecast", city).await?;
        Ok(raw.into())
    }

    #[instrument(skip(self))]
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, city: &str) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(WeatherError::Transport)?;

        let status = res.status();
        debug!(%status, "weather provider responded");
        match status {
            StatusCode::NOT_FOUND => Err(WeatherError::CityNotFound),
            s if !s.is_success() => Err(WeatherError::Status(s)),
            _ => res.json::<T>().await.map_err(WeatherError::Decode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client(base_url: &str) -> WeatherClient {
        WeatherClient::new(&WeatherConfig {
            api_key: "k3y".into(),
            base_url: base_url.into(),
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_key_units_and_encoded_city() {
        let provider = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "San Francisco"))
            .and(query_param("appid", "k3y"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "city": { "name": "San Francisco", "country": "US" },
                "list": []
            })))
            .expect(1)
            .mount(&provider)
            .await;

        let out = client(&provider.uri()).forecast("San Francisco").await.unwrap();
        assert_eq!(out.city, "San Francisco");
        assert!(out.forecast.is_empty());
    }

    #[tokio::test]
    async fn provider_404_means_city_not_found() {
        let provider = MockServer::start().await;
        Mock::given(path("/weather"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&provider)
            .await;

        let err = client(&provider.uri()).current("Nowhereville").await.unwrap_err();
        assert!(matches!(err, WeatherError::CityNotFound));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn other_failures_are_upstream() {
        let provider = MockServer::start().await;
        Mock::given(path("/weather"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&provider)
            .await;
        Mock::given(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&provider)
            .await;

        let c = client(&provider.uri());
        let err = c.current("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::Status(StatusCode::UNAUTHORIZED)));
        assert!(matches!(AppError::from(err), AppError::Upstream(_)));

        let err = c.forecast("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_provider_is_upstream() {
        let err = client("http://127.0.0.1:9").current("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::Transport(_)));
    }
}
