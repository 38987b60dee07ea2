use std::{collections::HashMap, time::Duration};

use anyhow::Result;
use axum::{extract::Query, response::Html, routing::get, Json, Router};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_test::assert_ok;

use waterflow::charts::ChartKind;
use waterflow::{routes, sensor, weather, AppState, Config, Dashboard, MemoryStorage, Scheduler};

/// Nothing listens on port 1, so requests there fail immediately.
const DEAD_UPSTREAM: &str = "http://127.0.0.1:1";

#[derive(Debug, Deserialize)]
struct FootprintView {
    total: String,
    unit: String,
    efficiency: String,
    badge_text: String,
    temperature: String,
}

#[derive(Debug, Deserialize)]
struct SensorReading {
    temperature: f64,
    humidity: f64,
    soil_moisture: f64,
    timestamp: String,
}

/// Serve the full router on an ephemeral port.
///
/// With `api_base = None` the dashboard polls its own reference backend.
async fn spawn_app(api_base: Option<&str>) -> Result<(String, AppState)> {
    // ---
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);

    let mut config = Config::local(api_base.unwrap_or(base.as_str()));
    config.geo_api_url = format!("{}/json/", DEAD_UPSTREAM);
    config.weather_api_url = DEAD_UPSTREAM.to_string();

    let dashboard = Dashboard::init(Box::new(MemoryStorage::new()))?;
    let state = AppState::new(dashboard, config);
    let app = routes::router(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok((base, state))
}

/// 2026-10-19 00:00:00 UTC, a Monday. Samples at 10:00 and 11:00 UTC land on
/// the same local day for every offset from -10h to +12h.
const MONDAY: i64 = 1_792_368_000;

/// Serve a stand-in upstream on an ephemeral port and return its base URL.
async fn spawn_upstream(app: Router) -> Result<String> {
    // ---
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(base)
}

/// Dashboard state whose sensor, geolocation, and weather calls all go to `upstream`.
fn upstream_state(upstream: &str) -> Result<AppState> {
    // ---
    let mut config = Config::local(upstream);
    config.geo_api_url = format!("{}/json/", upstream);
    config.weather_api_url = upstream.to_string();
    config.weather_api_key = Some("test-key".to_string());

    let dashboard = Dashboard::init(Box::new(MemoryStorage::new()))?;
    Ok(AppState::new(dashboard, config))
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "list": [
            {"dt": MONDAY + 10 * 3600, "main": {"temp": 18.0, "humidity": 70}},
            {"dt": MONDAY + 11 * 3600, "main": {"temp": 19.0, "humidity": 75}}
        ]
    })
}

/// Weather endpoints only answer for Oslo with the configured key.
fn keyed(params: &HashMap<String, String>) -> bool {
    params.get("q").map(String::as_str) == Some("Oslo")
        && params.get("appid").map(String::as_str) == Some("test-key")
        && params.get("units").map(String::as_str) == Some("metric")
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    // ---
    let (base, _state) = spawn_app(None).await?;
    let body: serde_json::Value = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn backend_serves_plausible_readings() -> Result<()> {
    // ---
    let (base, _state) = spawn_app(None).await?;
    let reading: SensorReading = Client::new()
        .get(format!("{}/api/sensor-data", base))
        .send()
        .await?
        .json()
        .await?;

    assert!((20.0..=30.0).contains(&reading.temperature));
    assert!((50.0..=80.0).contains(&reading.humidity));
    assert!((40.0..=70.0).contains(&reading.soil_moisture));
    assert!(!reading.timestamp.is_empty());
    Ok(())
}

#[tokio::test]
async fn poll_updates_cards_charts_and_history() -> Result<()> {
    // ---
    let (_base, state) = spawn_app(None).await?;

    let first = assert_ok!(sensor::poll(&state).await);
    let second = assert_ok!(sensor::poll(&state).await);

    let dashboard = state.dashboard.lock().await;
    assert_eq!(dashboard.history.entries().len(), 2);
    assert_eq!(dashboard.history.entries()[0].temperature, format!("{:.1}", second.temperature));
    assert_eq!(dashboard.previous.temperature, Some(second.temperature));
    assert_eq!(dashboard.rolling.len(), 2);
    assert_eq!(dashboard.cards.humidity.text, format!("{:.1}", second.humidity));

    let overview = dashboard.charts.get(ChartKind::Overview).unwrap();
    assert_eq!(overview.datasets[0].data, vec![first.temperature, second.temperature]);
    Ok(())
}

#[tokio::test]
async fn poll_falls_back_to_mock_reading() -> Result<()> {
    // ---
    let (_base, state) = spawn_app(Some(DEAD_UPSTREAM)).await?;

    let reading = assert_ok!(sensor::poll(&state).await);
    assert!((20.0..=30.0).contains(&reading.temperature));

    // The mock reading is persisted like a real one
    let dashboard = state.dashboard.lock().await;
    assert_eq!(dashboard.history.entries().len(), 1);
    assert_eq!(dashboard.rolling.len(), 1);
    Ok(())
}

#[tokio::test]
async fn poll_falls_back_on_non_json_body() -> Result<()> {
    // ---
    let upstream = spawn_upstream(Router::new().route(
        "/api/sensor-data",
        get(|| async { Html("<html><body>Maintenance</body></html>") }),
    ))
    .await?;
    let state = upstream_state(&upstream)?;

    let reading = assert_ok!(sensor::poll(&state).await);
    assert!((20.0..=30.0).contains(&reading.temperature));
    assert!((40.0..=70.0).contains(&reading.soil_moisture));

    let dashboard = state.dashboard.lock().await;
    assert_eq!(dashboard.history.entries().len(), 1);
    assert_eq!(dashboard.cards.temperature.text, format!("{:.1}", reading.temperature));
    Ok(())
}

#[tokio::test]
async fn poll_falls_back_on_error_status() -> Result<()> {
    // ---
    let upstream = spawn_upstream(Router::new().route(
        "/api/sensor-data",
        get(|| async {
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"temperature": 99.0, "humidity": 99.0, "soil_moisture": 99.0})),
            )
        }),
    ))
    .await?;
    let state = upstream_state(&upstream)?;

    // The body parses, but a non-2xx status still means mock data
    let reading = assert_ok!(sensor::poll(&state).await);
    assert!((20.0..=30.0).contains(&reading.temperature));

    let dashboard = state.dashboard.lock().await;
    assert_eq!(dashboard.rolling.len(), 1);
    assert_eq!(dashboard.history.entries().len(), 1);
    Ok(())
}

#[tokio::test]
async fn weather_refresh_uses_live_data() -> Result<()> {
    // ---
    let app = Router::new()
        .route(
            "/json/",
            get(|| async { Json(serde_json::json!({"city": "Oslo", "country_name": "Norway"})) }),
        )
        .route(
            "/weather",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if !keyed(&params) {
                    return Err(axum::http::StatusCode::UNAUTHORIZED);
                }
                Ok(Json(serde_json::json!({
                    "weather": [{"main": "Rain", "description": "light rain"}],
                    "main": {"temp": 17.5, "feels_like": 16.2, "humidity": 82, "pressure": 1009},
                    "wind": {"speed": 4.1}
                })))
            }),
        )
        .route(
            "/forecast",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if !keyed(&params) {
                    return Err(axum::http::StatusCode::UNAUTHORIZED);
                }
                Ok(Json(forecast_body()))
            }),
        );
    let upstream = spawn_upstream(app).await?;
    let state = upstream_state(&upstream)?;

    let label = weather::refresh_location(&state).await;
    assert_eq!(label, "Oslo, Norway");

    let conditions = weather::refresh_weather(&state).await;
    assert_eq!(conditions.temperature, "18°C");
    assert_eq!(conditions.condition, "light rain");
    assert_eq!(conditions.icon, "cloud-rain");

    let dashboard = state.dashboard.lock().await;
    assert_eq!(dashboard.weather.as_ref(), Some(&conditions));

    let forecast = dashboard.charts.get(ChartKind::Forecast).unwrap();
    assert_eq!(forecast.labels.len(), 1);
    assert_eq!(forecast.datasets[0].data, vec![18.5]);
    assert_eq!(forecast.datasets[1].data, vec![73.0]);
    Ok(())
}

#[tokio::test]
async fn weather_stages_fall_back_independently() -> Result<()> {
    // ---
    // Geolocation without a country still yields a usable city
    let app = Router::new()
        .route("/json/", get(|| async { Json(serde_json::json!({"city": "Oslo"})) }))
        .route(
            "/weather",
            get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/forecast", get(|| async { Json(forecast_body()) }));
    let upstream = spawn_upstream(app).await?;
    let state = upstream_state(&upstream)?;

    assert_eq!(weather::refresh_location(&state).await, "Oslo");

    let conditions = weather::refresh_weather(&state).await;
    assert_eq!(conditions.condition, "Partly Cloudy");
    assert_eq!(conditions.temperature, "24°C");

    // The forecast is real even though current conditions were mocked
    let dashboard = state.dashboard.lock().await;
    let forecast = dashboard.charts.get(ChartKind::Forecast).unwrap();
    assert_eq!(forecast.labels.len(), 1);
    assert_eq!(forecast.datasets[0].data, vec![18.5]);
    Ok(())
}

#[tokio::test]
async fn footprint_uses_backend_when_reachable() -> Result<()> {
    // ---
    let (base, _state) = spawn_app(None).await?;
    let response = Client::new()
        .post(format!("{}/footprint", base))
        .form(&[
            ("crop", "Tomato"),
            ("daily_usage", "100"),
            ("area", "50"),
            ("area_unit", "sqm"),
        ])
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let view: FootprintView = response.json().await?;
    assert_eq!(view.total, "1,500");
    assert_eq!(view.unit, "liters");
    assert_eq!(view.efficiency, "efficient");
    assert_eq!(view.badge_text, "Efficient Usage");
    // The reference backend reports its own sensor values
    assert!(view.temperature.ends_with("°C"));
    assert_ne!(view.temperature, "--°C");
    Ok(())
}

#[tokio::test]
async fn footprint_falls_back_to_local_calculation() -> Result<()> {
    // ---
    let (base, state) = spawn_app(Some(DEAD_UPSTREAM)).await?;
    sensor::poll(&state).await?;
    let shown = state.dashboard.lock().await.cards.temperature.text.clone();

    let client = Client::new();
    let first: FootprintView = client
        .post(format!("{}/footprint", base))
        .form(&[("crop", "Rice"), ("daily_usage", "100"), ("area", "1"), ("area_unit", "acre")])
        .send()
        .await?
        .json()
        .await?;

    // 100 × 30 × 40.4686
    assert_eq!(first.total, "121,405.8");
    assert_eq!(first.efficiency, "overuse");
    assert_eq!(first.badge_text, "Overuse Warning");
    assert_eq!(first.temperature, format!("{}°C", shown.parse::<f64>()?));

    let first_chart = state
        .dashboard
        .lock()
        .await
        .charts
        .get(ChartKind::Comparison)
        .map(|c| c.id);

    let second: FootprintView = client
        .post(format!("{}/footprint", base))
        .form(&[("crop", "Rice"), ("daily_usage", "100"), ("area", "700"), ("area_unit", "sqm")])
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(second.efficiency, "normal");

    let dashboard = state.dashboard.lock().await;
    let comparison = dashboard.charts.get(ChartKind::Comparison).unwrap();
    assert_ne!(Some(comparison.id), first_chart);
    assert_eq!(comparison.datasets[0].data, vec![21_000.0, 16_800.0]);
    Ok(())
}

#[tokio::test]
async fn footprint_rejects_bad_form() -> Result<()> {
    // ---
    let (base, _state) = spawn_app(None).await?;
    let response = Client::new()
        .post(format!("{}/footprint", base))
        .form(&[("crop", "Rice"), ("daily_usage", "plenty"), ("area", "1"), ("area_unit", "acre")])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn history_filter_sort_and_export() -> Result<()> {
    // ---
    let (base, state) = spawn_app(Some(DEAD_UPSTREAM)).await?;
    let client = Client::new();

    // Empty list renders the placeholder, even when filtered
    let body: serde_json::Value = client
        .get(format!("{}/history?search=zzz", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["kind"], "placeholder");

    sensor::poll(&state).await?;
    sensor::poll(&state).await?;

    let body: serde_json::Value = client
        .get(format!("{}/history?search=zzz", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["kind"], "rows");
    assert_eq!(body["rows"].as_array().map(Vec::len), Some(0));

    let body: serde_json::Value = client
        .post(format!("{}/history/sort/temperature", base))
        .send()
        .await?
        .json()
        .await?;
    let rows = body["rows"].as_array().cloned().unwrap_or_default();
    let temps: Vec<f64> = rows
        .iter()
        .filter_map(|r| r["temperature"].as_str()?.parse().ok())
        .collect();
    assert_eq!(temps.len(), 2);
    assert!(temps[0] >= temps[1]);

    let response = client
        .post(format!("{}/history/sort/colour", base))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.get(format!("{}/history/export", base)).send().await?;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("water-footprint-history-"));
    assert!(disposition.ends_with(".csv\""));

    let csv = response.text().await?;
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Timestamp,Temperature (°C)"));
    assert_eq!(lines[1].split(',').count(), 5);
    Ok(())
}

#[tokio::test]
async fn navigation_and_weather_fallback() -> Result<()> {
    // ---
    let (base, state) = spawn_app(None).await?;
    let client = Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/pages/history", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["heading"], "History");

    let response = client.post(format!("{}/pages/settings", base)).send().await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Geolocation is unreachable and no key is set: everything is mock data
    let conditions: serde_json::Value = client
        .post(format!("{}/weather/refresh", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(conditions["temperature"], "24°C");
    assert_eq!(conditions["condition"], "Partly Cloudy");
    assert_eq!(conditions["icon"], "cloud");

    let dashboard = state.dashboard.lock().await;
    let forecast = dashboard.charts.get(ChartKind::Forecast).unwrap();
    assert_eq!(forecast.labels.len(), 7);
    assert_eq!(forecast.datasets[1].data[0], 65.0);
    Ok(())
}

#[tokio::test]
async fn snapshot_exposes_dashboard_state() -> Result<()> {
    // ---
    let (base, state) = spawn_app(Some(DEAD_UPSTREAM)).await?;
    sensor::poll(&state).await?;

    let body: serde_json::Value = Client::new()
        .get(format!("{}/dashboard", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["heading"], "Dashboard");
    assert_eq!(body["cards"]["weather"], "Clear");
    assert!(body["charts"]["charts"]["soil"].is_object());
    assert_eq!(body["history"]["entries"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn scheduler_drives_clock_polls_and_resync() -> Result<()> {
    // ---
    let mut config = Config::local(DEAD_UPSTREAM);
    config.clock_interval = Duration::from_millis(20);
    config.sensor_poll_interval = Duration::from_millis(30);
    config.chart_resync_interval = Duration::from_millis(40);

    let dashboard = Dashboard::init(Box::new(MemoryStorage::new()))?;
    let state = AppState::new(dashboard, config);

    let scheduler = Scheduler::start(&state);
    tokio::time::sleep(Duration::from_millis(400)).await;
    scheduler.abort();

    let dashboard = state.dashboard.lock().await;
    assert!(!dashboard.clock.is_empty());
    assert!(!dashboard.history.entries().is_empty());
    assert!(dashboard.rolling.len() <= 20);

    let temperature = dashboard.charts.get(ChartKind::Temperature).unwrap();
    // Each poll redraws once; resync ticks add more on top
    assert!(temperature.redraws > temperature.datasets[0].data.len() as u64);
    Ok(())
}
