//! Water footprint calculator.
//!
//! A submission moves the panel Idle → Submitted → Displayed; every new
//! submission starts the cycle again. The backend does the math when it is
//! reachable, otherwise the same formula runs locally with the sensor values
//! currently shown on the metric cards.

use serde::Serialize;

use crate::dashboard::AppState;
use crate::display::format_grouped;
use crate::error::FetchError;
use crate::fetch::{fetch_json, FetchResultExt};
use crate::models::{
    Efficiency, FootprintRequest, FootprintResult, SensorSnapshot, IDEAL_USAGE_RATIO,
};

// ---

/// Days in the billing month the footprint is computed over.
pub const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintPhase {
    #[default]
    Idle,
    Submitted,
    Displayed,
}

/// Rendered calculator result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootprintView {
    /// Total with digit grouping, e.g. `12,140.58`.
    pub total: String,
    pub unit: String,
    pub efficiency: Efficiency,
    pub badge_text: &'static str,
    pub temperature: String,
    pub humidity: String,
    pub soil_moisture: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalculatorPanel {
    pub phase: FootprintPhase,
    pub result: Option<FootprintView>,
}

impl CalculatorPanel {
    /// Render `result` and return what is now shown.
    pub fn display(&mut self, result: &FootprintResult) -> FootprintView {
        // ---
        let snapshot = result.sensor_snapshot;
        let view = FootprintView {
            total: format_grouped(result.total_footprint),
            unit: result.unit.clone(),
            efficiency: result.efficiency,
            badge_text: result.efficiency.label(),
            temperature: with_unit(snapshot.temperature, "°C"),
            humidity: with_unit(snapshot.humidity, "%"),
            soil_moisture: with_unit(snapshot.soil_moisture, "%"),
        };
        self.result = Some(view.clone());
        self.phase = FootprintPhase::Displayed;
        view
    }
}

/// Compute a footprint locally.
///
/// `total = daily_usage × 30 × (area_m² / 100)`, ideal is 80 % of that.
pub fn compute_footprint(request: &FootprintRequest, snapshot: SensorSnapshot) -> FootprintResult {
    // ---
    let area_sqm = request.area_unit.to_sqm(request.area);
    let total_footprint = request.daily_usage * DAYS_PER_MONTH * (area_sqm / 100.0);

    FootprintResult {
        total_footprint,
        unit: "liters".to_string(),
        efficiency: Efficiency::classify(total_footprint),
        ideal_usage: Some(total_footprint * IDEAL_USAGE_RATIO),
        crop: None,
        sensor_snapshot: snapshot,
    }
}

/// Ask the backend to compute the footprint.
pub async fn request_footprint(
    client: &reqwest::Client,
    api_base_url: &str,
    request: &FootprintRequest,
) -> Result<FootprintResult, FetchError> {
    // ---
    let url = format!("{}/api/calculate-footprint", api_base_url);
    fetch_json(client.post(&url).json(request), &url).await
}

/// Handle one calculator submission end to end.
pub async fn submit(state: &AppState, request: FootprintRequest) -> FootprintView {
    // ---
    tracing::info!(
        "Calculating footprint for {:?}: {} L/day over {} {:?}",
        request.crop,
        request.daily_usage,
        request.area,
        request.area_unit
    );

    state.dashboard.lock().await.begin_calculation();

    let fetched = request_footprint(&state.client, &state.config.api_base_url, &request).await;

    let mut dashboard = state.dashboard.lock().await;
    let result = fetched.use_fallback("footprint", || {
        compute_footprint(&request, dashboard.sensor_snapshot())
    });

    dashboard.show_footprint(&result)
}

fn with_unit(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => format!("--{unit}"),
    }
}
