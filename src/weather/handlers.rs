use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
    weather::dto::{CityQuery, CurrentWeather, Forecast},
};

pub fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/weather/current", get(current_weather))
        .route("/weather/forecast", get(forecast))
}

fn required_city(query: CityQuery) -> Result<String, AppError> {
    query
        .city
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("City parameter is required".into()))
}

#[instrument(skip(state, query))]
pub async fn current_weather(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<CityQuery>,
) -> Result<Json<CurrentWeather>, AppError> {
    let city = required_city(query)?;
    let weather = state.weather.current(&city).await?;
    info!(%user_id, %city, "current weather served");
    Ok(Json(weather))
}

#[instrument(skip(state, query))]
pub async fn forecast(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<CityQuery>,
) -> Result<Json<Forecast>, AppError> {
    let city = required_city(query)?;
    let forecast = state.weather.forecast(&city).await?;
    info!(%user_id, %city, entries = forecast.forecast.len(), "forecast served");
    Ok(Json(forecast))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::config::AuthStrategy;
    use crate::test_support::{ann, bearer, register, test_server, test_server_with_weather};

    #[tokio::test]
    async fn current_weather_is_reshaped() {
        let provider = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Paris",
                "sys": { "country": "FR" },
                "main": { "temp": 21.0, "feels_like": 20.4, "humidity": 55, "pressure": 1015 },
                "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
                "wind": { "speed": 2.6, "deg": 90 },
                "coord": { "lat": 48.8534, "lon": 2.3488 }
            })))
            .mount(&provider)
            .await;

        let server = test_server_with_weather(AuthStrategy::Jwt, &provider.uri());
        let token = register(&server, &ann()).await;
        let (name, value) = bearer(&token);

        let res = server
            .get("/api/weather/current")
            .add_query_param("city", "Paris")
            .add_header(name, value)
            .await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert_eq!(body["city"], "Paris");
        assert_eq!(body["country"], "FR");
        assert_eq!(body["temperature"], 21.0);
        assert_eq!(body["wind_speed"], 2.6);
        assert_eq!(body["coordinates"]["latitude"], 48.8534);
        assert!(body.get("deg").is_none());
    }

    #[tokio::test]
    async fn unknown_city_is_not_found() {
        let provider = MockServer::start().await;
        Mock::given(path("/weather"))
            .and(query_param("q", "Nowhereville"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&provider)
            .await;

        let server = test_server_with_weather(AuthStrategy::Jwt, &provider.uri());
        let token = register(&server, &ann()).await;
        let (name, value) = bearer(&token);

        let res = server
            .get("/api/weather/current")
            .add_query_param("city", "Nowhereville")
            .add_header(name, value)
            .await;
        res.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(res.json::<Value>()["error"], "City not found");
    }

    #[tokio::test]
    async fn provider_outage_is_bad_gateway() {
        let provider = MockServer::start().await;
        Mock::given(path("/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&provider)
            .await;

        let server = test_server_with_weather(AuthStrategy::Jwt, &provider.uri());
        let token = register(&server, &ann()).await;
        let (name, value) = bearer(&token);

        let res = server
            .get("/api/weather/forecast")
            .add_query_param("city", "Paris")
            .add_header(name, value)
            .await;
        res.assert_status(StatusCode::BAD_GATEWAY);
        assert_eq!(res.json::<Value>()["error"], "Weather service unavailable");
    }

    #[tokio::test]
    async fn forecast_lists_entries_in_order() {
        let provider = MockServer::start().await;
        Mock::given(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "city": { "name": "Rome", "country": "IT" },
                "list": [
                    { "dt_txt": "2024-06-01 09:00:00", "main": { "temp": 24.0, "humidity": 40 },
                      "weather": [{ "description": "few clouds", "icon": "02d" }], "wind": { "speed": 1.5 } },
                    { "dt_txt": "2024-06-01 12:00:00", "main": { "temp": 28.0, "humidity": 35 },
                      "weather": [{ "description": "clear sky", "icon": "01d" }], "wind": { "speed": 2.0 } }
                ]
            })))
            .mount(&provider)
            .await;

        let server = test_server_with_weather(AuthStrategy::Jwt, &provider.uri());
        let token = register(&server, &ann()).await;
        let (name, value) = bearer(&token);

        let body: Value = server
            .get("/api/weather/forecast")
            .add_query_param("city", "Rome")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(body["city"], "Rome");
        assert_eq!(body["forecast"][0]["date"], "2024-06-01 09:00:00");
        assert_eq!(body["forecast"][1]["date"], "2024-06-01 12:00:00");
        assert_eq!(body["forecast"][1]["description"], "clear sky");
    }

    #[tokio::test]
    async fn city_is_required() {
        let server = test_server(AuthStrategy::Jwt);
        let token = register(&server, &ann()).await;
        let (name, value) = bearer(&token);

        let res = server
            .get("/api/weather/current")
            .add_header(name.clone(), value.clone())
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "City parameter is required");

        server
            .get("/api/weather/forecast")
            .add_query_param("city", "   ")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn weather_requires_authentication() {
        let server = test_server(AuthStrategy::Jwt);
        server
            .get("/api/weather/current")
            .add_query_param("city", "Paris")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
