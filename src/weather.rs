//! Weather controller: location lookup, current conditions, and the 5-day
//! forecast aggregated into daily averages.
//!
//! Each stage has its own mock fallback, so a failed current-conditions call
//! does not keep a working forecast from rendering, and vice versa. Without a
//! resolved city both stages show mock data.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::dashboard::AppState;
use crate::display::round1;
use crate::error::FetchError;
use crate::fetch::{fetch_json, FetchResultExt};
use crate::Config;

// ---

/// Days shown on the forecast chart.
pub const FORECAST_DAYS: usize = 7;

pub const LOCATION_UNAVAILABLE: &str = "Location unavailable";

/// Geolocation lookup response.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoLocation {
    pub city: String,
    /// Only used for the header label; weather lookups need the city alone.
    #[serde(default)]
    pub country_name: Option<String>,
}

impl GeoLocation {
    /// Header label: `City, Country`, or just the city when no country came back.
    pub fn label(&self) -> String {
        match &self.country_name {
            Some(country) => format!("{}, {}", self.city, country),
            None => self.city.clone(),
        }
    }
}

/// Current-conditions response (OpenWeather `weather` endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherResponse {
    pub weather: Vec<ConditionInfo>,
    pub main: MainReadings,
    pub wind: Wind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionInfo {
    /// Condition category, e.g. `Rain`.
    pub main: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

/// 5-day / 3-hour forecast response.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastItem {
    /// Unix seconds.
    pub dt: i64,
    pub main: ForecastMain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
    pub humidity: f64,
}

/// What the weather page shows for current conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temperature: String,
    pub condition: String,
    pub feels_like: String,
    pub humidity: String,
    pub pressure: String,
    pub wind: String,
    pub icon: &'static str,
}

/// Daily averages, one entry per weekday label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyForecast {
    pub labels: Vec<String>,
    pub temperatures: Vec<f64>,
    pub humidity: Vec<f64>,
}

// ---

/// Icon name for a condition category; unknown categories get `cloud`.
pub fn icon_for(condition: &str) -> &'static str {
    // ---
    match condition {
        "Clear" => "sun",
        "Clouds" => "cloud",
        "Rain" => "cloud-rain",
        "Snow" => "cloud-snow",
        "Thunderstorm" => "cloud-lightning",
        "Drizzle" => "cloud-drizzle",
        "Mist" => "cloud-fog",
        _ => "cloud",
    }
}

impl CurrentConditions {
    pub fn from_response(data: &CurrentWeatherResponse) -> Self {
        // ---
        let (category, description) = data
            .weather
            .first()
            .map(|c| (c.main.as_str(), c.description.clone()))
            .unwrap_or(("", String::new()));

        CurrentConditions {
            temperature: format!("{}°C", round_half_up(data.main.temp)),
            condition: description,
            feels_like: format!("{}°C", round_half_up(data.main.feels_like)),
            humidity: format!("{}%", data.main.humidity),
            pressure: format!("{} hPa", data.main.pressure),
            wind: format!("{} m/s", data.wind.speed),
            icon: icon_for(category),
        }
    }

    pub fn mock() -> Self {
        // ---
        CurrentConditions {
            temperature: "24°C".to_string(),
            condition: "Partly Cloudy".to_string(),
            feels_like: "22°C".to_string(),
            humidity: "65%".to_string(),
            pressure: "1013 hPa".to_string(),
            wind: "3.5 m/s".to_string(),
            icon: "cloud",
        }
    }
}

impl DailyForecast {
    pub fn mock() -> Self {
        // ---
        DailyForecast {
            labels: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            temperatures: vec![24.0, 26.0, 25.0, 23.0, 22.0, 24.0, 25.0],
            humidity: vec![65.0, 70.0, 68.0, 72.0, 75.0, 70.0, 68.0],
        }
    }
}

/// Group forecast samples by weekday label (in first-seen order) and average
/// the first [`FORECAST_DAYS`] days: temperature to one decimal, humidity to
/// a whole percent.
pub fn aggregate_forecast<Tz>(items: &[ForecastItem], tz: &Tz) -> DailyForecast
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    // ---
    let mut days: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::new();

    for item in items {
        let Some(utc) = DateTime::from_timestamp(item.dt, 0) else {
            tracing::debug!("Skipping forecast sample with invalid dt {}", item.dt);
            continue;
        };
        let label = utc.with_timezone(tz).format("%a").to_string();

        match days.iter_mut().find(|(day, _, _)| *day == label) {
            Some((_, temps, humidity)) => {
                temps.push(item.main.temp);
                humidity.push(item.main.humidity);
            }
            None => days.push((label, vec![item.main.temp], vec![item.main.humidity])),
        }
    }

    let mut forecast = DailyForecast::default();
    for (label, temps, humidity) in days.into_iter().take(FORECAST_DAYS) {
        forecast.labels.push(label);
        forecast.temperatures.push(round1(mean(&temps)));
        forecast.humidity.push(mean(&humidity).round());
    }
    forecast
}

// ---

pub async fn fetch_location(client: &reqwest::Client, url: &str) -> Result<GeoLocation, FetchError> {
    fetch_json(client.get(url), url).await
}

pub async fn fetch_current(
    client: &reqwest::Client,
    config: &Config,
    city: &str,
) -> Result<CurrentWeatherResponse, FetchError> {
    // ---
    let url = format!("{}/weather", config.weather_api_url);
    let request = keyed_request(client, config, &url, city)?;
    fetch_json(request, &url).await
}

pub async fn fetch_forecast(
    client: &reqwest::Client,
    config: &Config,
    city: &str,
) -> Result<ForecastResponse, FetchError> {
    // ---
    let url = format!("{}/forecast", config.weather_api_url);
    let request = keyed_request(client, config, &url, city)?;
    fetch_json(request, &url).await
}

/// Refresh the weather page: current conditions, then the forecast chart.
pub async fn refresh_weather(state: &AppState) -> CurrentConditions {
    // ---
    let client = &state.client;
    let config = &state.config;

    let city = fetch_location(client, &config.geo_api_url)
        .await
        .map(|location| Some(location.city))
        .use_fallback("location", || None);

    let conditions = match &city {
        Some(city) => fetch_current(client, config, city)
            .await
            .map(|data| CurrentConditions::from_response(&data))
            .use_fallback("weather", CurrentConditions::mock),
        None => CurrentConditions::mock(),
    };

    state.dashboard.lock().await.apply_weather(conditions.clone());

    let forecast = match &city {
        Some(city) => fetch_forecast(client, config, city)
            .await
            .map(|data| aggregate_forecast(&data.list, &Local))
            .use_fallback("forecast", DailyForecast::mock),
        None => DailyForecast::mock(),
    };

    state.dashboard.lock().await.apply_forecast(forecast);
    conditions
}

/// Resolve the header location label once.
pub async fn refresh_location(state: &AppState) -> String {
    // ---
    let label = fetch_location(&state.client, &state.config.geo_api_url)
        .await
        .map(|location| location.label())
        .use_fallback("location", || LOCATION_UNAVAILABLE.to_string());

    state.dashboard.lock().await.set_location(label.clone());
    label
}

fn keyed_request(
    client: &reqwest::Client,
    config: &Config,
    url: &str,
    city: &str,
) -> Result<reqwest::RequestBuilder, FetchError> {
    // ---
    let key = config
        .weather_api_key
        .as_deref()
        .ok_or(FetchError::MissingApiKey { service: "weather" })?;

    Ok(client
        .get(url)
        .query(&[("q", city), ("appid", key), ("units", "metric")]))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round to the nearest integer with halves going up, as the display expects.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::Utc;

    fn item(dt: i64, temp: f64, humidity: f64) -> ForecastItem {
        ForecastItem {
            dt,
            main: ForecastMain { temp, humidity },
        }
    }

    /// 2026-10-19 00:00:00 UTC, a Monday.
    const MONDAY: i64 = 1_792_368_000;
    const DAY: i64 = 86_400;

    #[test]
    fn test_icon_lookup() {
        // ---
        assert_eq!(icon_for("Clear"), "sun");
        assert_eq!(icon_for("Rain"), "cloud-rain");
        assert_eq!(icon_for("Mist"), "cloud-fog");
        assert_eq!(icon_for("Tornado"), "cloud");
        assert_eq!(icon_for(""), "cloud");
    }

    #[test]
    fn test_aggregate_groups_by_weekday() {
        // ---
        let items = vec![
            item(MONDAY + 3 * 3600, 20.0, 60.0),
            item(MONDAY + 6 * 3600, 21.0, 61.0),
            item(MONDAY + 9 * 3600, 23.5, 64.0),
            item(MONDAY + DAY, 18.0, 80.0),
        ];
        let forecast = aggregate_forecast(&items, &Utc);

        assert_eq!(forecast.labels, vec!["Mon", "Tue"]);
        assert_eq!(forecast.temperatures, vec![21.5, 18.0]);
        assert_eq!(forecast.humidity, vec![62.0, 80.0]);
    }

    #[test]
    fn test_aggregate_keeps_first_seven_days() {
        // ---
        let items: Vec<_> = (0..9).map(|d| item(MONDAY + d * DAY, d as f64, 50.0)).collect();
        let forecast = aggregate_forecast(&items, &Utc);

        assert_eq!(forecast.labels.len(), FORECAST_DAYS);
        assert_eq!(forecast.labels[0], "Mon");
        assert_eq!(forecast.labels[6], "Sun");
        // Day 8 (next Monday) folds into the first Monday bucket
        assert_eq!(forecast.temperatures[0], 3.5);
    }

    #[test]
    fn test_aggregate_rounds_means() {
        // ---
        let items = vec![
            item(MONDAY, 20.04, 60.0),
            item(MONDAY + 3600, 20.08, 61.0),
        ];
        let forecast = aggregate_forecast(&items, &Utc);

        assert_eq!(forecast.temperatures, vec![20.1]);
        assert_eq!(forecast.humidity, vec![61.0]);
    }

    #[test]
    fn test_current_conditions_display() {
        // ---
        let json = r#"{
            "weather": [{"main": "Rain", "description": "light rain"}],
            "main": {"temp": 17.5, "feels_like": 16.2, "humidity": 82, "pressure": 1009},
            "wind": {"speed": 4.1}
        }"#;
        let data: CurrentWeatherResponse = serde_json::from_str(json).unwrap();
        let conditions = CurrentConditions::from_response(&data);

        assert_eq!(conditions.temperature, "18°C");
        assert_eq!(conditions.feels_like, "16°C");
        assert_eq!(conditions.condition, "light rain");
        assert_eq!(conditions.humidity, "82%");
        assert_eq!(conditions.pressure, "1009 hPa");
        assert_eq!(conditions.wind, "4.1 m/s");
        assert_eq!(conditions.icon, "cloud-rain");
    }

    #[test]
    fn test_location_without_country() {
        // ---
        let full: GeoLocation =
            serde_json::from_str(r#"{"city":"Oslo","country_name":"Norway"}"#).unwrap();
        assert_eq!(full.label(), "Oslo, Norway");

        let city_only: GeoLocation = serde_json::from_str(r#"{"city":"Oslo"}"#).unwrap();
        assert_eq!(city_only.city, "Oslo");
        assert_eq!(city_only.label(), "Oslo");
    }

    #[test]
    fn test_mock_forecast_is_a_week() {
        // ---
        let mock = DailyForecast::mock();
        assert_eq!(mock.labels.len(), 7);
        assert_eq!(mock.temperatures.len(), 7);
        assert_eq!(mock.humidity[4], 75.0);
    }

    #[test]
    fn test_missing_key_skips_network() {
        // ---
        let client = reqwest::Client::new();
        let config = Config::local("http://127.0.0.1:1");

        let result = keyed_request(&client, &config, "http://127.0.0.1:1/weather", "Oslo");
        assert!(matches!(result, Err(FetchError::MissingApiKey { .. })));
    }
}
