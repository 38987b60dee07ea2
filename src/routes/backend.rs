//! Reference sensor/footprint backend.
//!
//! The dashboard polls `{API_BASE_URL}/api/...`; pointing that at this same
//! service gives a self-contained demo with randomized readings.

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::display::round2;
use crate::footprint::compute_footprint;
use crate::sensor::mock_reading;
use crate::{AreaUnit, FootprintRequest, FootprintResult, SensorReading, SensorSnapshot};

// ---

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/api/sensor-data", get(sensor_data))
        .route("/api/calculate-footprint", post(calculate_footprint))
}

/// Lenient calculator body: every field is optional.
#[derive(Debug, Deserialize)]
struct CalculateBody {
    #[serde(default = "unknown_crop")]
    crop: String,
    #[serde(default)]
    daily_usage: f64,
    #[serde(default)]
    area: f64,
    #[serde(default)]
    area_unit: Option<String>,
}

async fn sensor_data() -> Json<SensorReading> {
    Json(mock_reading())
}

async fn calculate_footprint(Json(body): Json<CalculateBody>) -> Json<FootprintResult> {
    // ---
    debug!("POST /api/calculate-footprint - {:?}", body);

    let area_unit = match body.area_unit.as_deref() {
        Some("acre") => AreaUnit::Acre,
        _ => AreaUnit::Sqm,
    };
    let request = FootprintRequest {
        crop: body.crop,
        daily_usage: body.daily_usage,
        area: body.area,
        area_unit,
    };

    // The backend has no metric cards; it reports its own sensor values.
    let current = mock_reading();
    let snapshot = SensorSnapshot {
        temperature: Some(current.temperature),
        humidity: Some(current.humidity),
        soil_moisture: Some(current.soil_moisture),
    };

    let mut result = compute_footprint(&request, snapshot);
    result.total_footprint = round2(result.total_footprint);
    result.ideal_usage = result.ideal_usage.map(round2);
    result.crop = Some(request.crop);
    Json(result)
}

fn unknown_crop() -> String {
    "Unknown".to_string()
}
