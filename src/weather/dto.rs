//! Provider payloads (OpenWeatherMap, metric units) and the shapes we hand to clients.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwmCondition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct OwmMain {
    pub temp: f64,
    pub feels_like: Option<f64>,
    pub humidity: i64,
    pub pressure: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OwmWind {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct OwmCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct OwmSys {
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwmCurrent {
    pub name: String,
    #[serde(default)]
    pub sys: OwmSys,
    pub main: OwmMain,
    #[serde(default)]
    pub weather: Vec<OwmCondition>,
    pub wind: OwmWind,
    pub coord: OwmCoord,
}

#[derive(Debug, Deserialize)]
pub struct OwmForecastItem {
    pub dt_txt: String,
    pub main: OwmMain,
    #[serde(default)]
    pub weather: Vec<OwmCondition>,
    pub wind: OwmWind,
}

#[derive(Debug, Deserialize)]
pub struct OwmCity {
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwmForecast {
    pub city: OwmCity,
    #[serde(default)]
    pub list: Vec<OwmForecastItem>,
}

#[derive(Debug, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct CurrentWeather {
    pub city: String,
    pub country: Option<String>,
    pub temperature: f64,
    /// `null` when the provider omits it.
    pub feels_like: Option<f64>,
    pub humidity: i64,
    pub pressure: Option<i64>,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
    pub coordinates: Coordinates,
}

#[derive(Debug, Serialize)]
pub struct ForecastEntry {
    pub date: String,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
    pub humidity: i64,
    pub wind_speed: f64,
}

#[derive(Debug, Serialize)]
pub struct Forecast {
    pub city: String,
    pub country: Option<String>,
    pub forecast: Vec<ForecastEntry>,
}

/// Description and icon of the leading condition, empty when the provider sent none.
fn leading_condition(conditions: Vec<OwmCondition>) -> (String, String) {
    conditions
        .into_iter()
        .next()
        .map(|c| (c.description, c.icon))
        .unwrap_or_default()
}

impl From<OwmCurrent> for CurrentWeather {
    fn from(raw: OwmCurrent) -> Self {
        let (description, icon) = leading_condition(raw.weather);
        Self {
            city: raw.name,
            country: raw.sys.country,
            temperature: raw.main.temp,
            feels_like: raw.main.feels_like,
            humidity: raw.main.humidity,
            pressure: raw.main.pressure,
            description,
            icon,
            wind_speed: raw.wind.speed,
            coordinates: Coordinates {
                latitude: raw.coord.lat,
                longitude: raw.coord.lon,
            },
        }
    }
}

impl From<OwmForecastItem> for ForecastEntry {
    fn from(item: OwmForecastItem) -> Self {
        let (description, icon) = leading_condition(item.weather);
        Self {
            date: item.dt_txt,
            temperature: item.main.temp,
            description,
            icon,
            humidity: item.main.humidity,
            wind_speed: item.wind.speed,
        }
    }
}

impl From<OwmForecast> for Forecast {
    fn from(raw: OwmForecast) -> Self {
        Self {
            city: raw.city.name,
            country: raw.city.country,
            forecast: raw.list.into_iter().map(ForecastEntry::from).collect(),
        }
    }
}
