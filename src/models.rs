//! Simple data models for the water footprint dashboard.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::display::format_timestamp;
use crate::error::FormError;

// ---

/// One sensor reading, as served by `GET /api/sensor-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    // ---
    #[serde(deserialize_with = "lenient_f64")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub humidity: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub soil_moisture: f64,
    /// ISO-8601 timestamp; defaults to "now" when the upstream omits it.
    #[serde(default = "now_rfc3339")]
    pub timestamp: String,
}

/// One row of the persisted history table. All fields are display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    // ---
    pub timestamp: String,
    pub temperature: String,
    pub humidity: String,
    pub soil_moisture: String,
    pub footprint: String,
}

/// Direction of the arrow next to a metric card value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    #[default]
    Unchanged,
    Up,
    Down,
}

/// Last-seen value per metric, used only for trend arrows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreviousValues {
    // ---
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    Sqm,
    Acre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Efficiency {
    Efficient,
    Normal,
    Overuse,
}

/// Calculator input, sent as the body of `POST /api/calculate-footprint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRequest {
    // ---
    pub crop: String,
    pub daily_usage: f64,
    pub area: f64,
    pub area_unit: AreaUnit,
}

/// Raw calculator form fields, before parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct FootprintForm {
    // ---
    #[serde(default)]
    pub crop: String,
    pub daily_usage: String,
    pub area: String,
    #[serde(default = "default_area_unit")]
    pub area_unit: String,
}

/// Sensor values shown next to a calculator result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    // ---
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
}

/// Calculator output, either from the backend or computed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintResult {
    // ---
    pub total_footprint: f64,
    pub unit: String,
    pub efficiency: Efficiency,
    /// Older backends omit this; readers fall back to 80 % of the total.
    #[serde(default)]
    pub ideal_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(rename = "sensor_data", default)]
    pub sensor_snapshot: SensorSnapshot,
}

// ---

impl SensorReading {
    // ---
    /// Reading stamped with the current time.
    pub fn now(temperature: f64, humidity: f64, soil_moisture: f64) -> Self {
        // ---
        SensorReading {
            temperature,
            humidity,
            soil_moisture,
            timestamp: now_rfc3339(),
        }
    }

    /// Parsed timestamp, if the upstream sent a valid RFC 3339 string.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        // ---
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Build the history row for this reading with the given footprint.
    pub fn to_history_entry(&self, footprint: u32) -> HistoryEntry {
        // ---
        let timestamp = match self.parsed_timestamp() {
            Some(t) => format_timestamp(&t.with_timezone(&Local)),
            None => self.timestamp.clone(),
        };

        HistoryEntry {
            timestamp,
            temperature: format!("{:.1}", self.temperature),
            humidity: format!("{:.1}", self.humidity),
            soil_moisture: format!("{:.1}", self.soil_moisture),
            footprint: footprint.to_string(),
        }
    }
}

impl HistoryEntry {
    /// Field values in table and CSV column order.
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.timestamp,
            &self.temperature,
            &self.humidity,
            &self.soil_moisture,
            &self.footprint,
        ]
    }
}

impl Trend {
    /// Compare a new value against the previous one.
    ///
    /// Returns `None` when the arrow should keep whatever it showed before:
    /// no previous value, or the value did not move.
    pub fn between(previous: Option<f64>, current: f64) -> Option<Trend> {
        // ---
        let previous = previous?;
        if current > previous {
            Some(Trend::Up)
        } else if current < previous {
            Some(Trend::Down)
        } else {
            None
        }
    }
}

impl AreaUnit {
    /// Square meters per unit.
    pub fn to_sqm(self, area: f64) -> f64 {
        // ---
        match self {
            AreaUnit::Sqm => area,
            AreaUnit::Acre => area * SQM_PER_ACRE,
        }
    }
}

impl std::str::FromStr for AreaUnit {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqm" => Ok(AreaUnit::Sqm),
            "acre" => Ok(AreaUnit::Acre),
            other => Err(FormError::UnknownAreaUnit(other.to_string())),
        }
    }
}

impl Efficiency {
    /// Classify a monthly footprint in liters.
    pub fn classify(total_footprint: f64) -> Self {
        // ---
        if total_footprint < EFFICIENT_LIMIT {
            Efficiency::Efficient
        } else if total_footprint < NORMAL_LIMIT {
            Efficiency::Normal
        } else {
            Efficiency::Overuse
        }
    }

    /// Badge text shown next to a result.
    pub fn label(self) -> &'static str {
        match self {
            Efficiency::Efficient => "Efficient Usage",
            Efficiency::Normal => "Normal Usage",
            Efficiency::Overuse => "Overuse Warning",
        }
    }
}

impl FootprintForm {
    /// Parse the raw form fields into a typed request.
    pub fn parse(&self) -> Result<FootprintRequest, FormError> {
        // ---
        Ok(FootprintRequest {
            crop: self.crop.trim().to_string(),
            daily_usage: parse_number("daily_usage", &self.daily_usage)?,
            area: parse_number("area", &self.area)?,
            area_unit: self.area_unit.parse()?,
        })
    }
}

impl FootprintResult {
    /// Ideal usage, defaulting to 80 % of the total when absent.
    pub fn ideal_or_default(&self) -> f64 {
        self.ideal_usage
            .unwrap_or(self.total_footprint * IDEAL_USAGE_RATIO)
    }
}

// ---

pub const SQM_PER_ACRE: f64 = 4046.86;
pub const EFFICIENT_LIMIT: f64 = 15_000.0;
pub const NORMAL_LIMIT: f64 = 30_000.0;
pub const IDEAL_USAGE_RATIO: f64 = 0.8;

fn parse_number(field: &'static str, value: &str) -> Result<f64, FormError> {
    // ---
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FormError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn default_area_unit() -> String {
    "sqm".to_string()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Accept either a JSON number or a numeric string.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    // ---
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    let value = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number {s:?}: {e}")))?,
    };

    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!("non-finite reading {value}")));
    }
    Ok(value)
}
