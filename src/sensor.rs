//! Sensor data controller: fetch the latest reading and push it through the
//! dashboard. A failed fetch is replaced by a plausible mock reading that
//! then takes exactly the same path, persistence included.

use crate::dashboard::AppState;
use crate::display::round1;
use crate::error::{FetchError, StorageError};
use crate::fetch::{fetch_json, FetchResultExt};
use crate::models::SensorReading;

// ---

/// `GET {base}/api/sensor-data`.
pub async fn fetch_sensor_data(
    client: &reqwest::Client,
    api_base_url: &str,
) -> Result<SensorReading, FetchError> {
    // ---
    let url = format!("{}/api/sensor-data", api_base_url);
    fetch_json(client.get(&url), &url).await
}

/// Random reading in plausible ranges, stamped now.
///
/// Temperature 20–30 °C, humidity 50–80 %, soil moisture 40–70 %, each
/// rounded to one decimal.
pub fn mock_reading() -> SensorReading {
    // ---
    SensorReading::now(
        round1(20.0 + fastrand::f64() * 10.0),
        round1(50.0 + fastrand::f64() * 30.0),
        round1(40.0 + fastrand::f64() * 30.0),
    )
}

/// One poll: fetch (or mock), then update cards, charts, and history.
pub async fn poll(state: &AppState) -> Result<SensorReading, StorageError> {
    // ---
    let reading = fetch_sensor_data(&state.client, &state.config.api_base_url)
        .await
        .use_fallback("sensor data", mock_reading);

    tracing::debug!(
        "Reading: {:.1}°C, {:.1}% humidity, {:.1}% soil",
        reading.temperature,
        reading.humidity,
        reading.soil_moisture
    );

    state.dashboard.lock().await.apply_reading(&reading)?;
    Ok(reading)
}
