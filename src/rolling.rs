//! Fixed-capacity rolling window of recent readings feeding the live charts.

use std::collections::VecDeque;

use serde::Serialize;

use crate::models::SensorReading;

// ---

/// Number of points kept per metric.
pub const ROLLING_CAPACITY: usize = 20;

/// Four parallel FIFO sequences, one per metric plus the time labels.
///
/// All four always have the same length, never above [`ROLLING_CAPACITY`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RollingHistory {
    // ---
    temperature: VecDeque<f64>,
    humidity: VecDeque<f64>,
    soil_moisture: VecDeque<f64>,
    labels: VecDeque<String>,
}

impl RollingHistory {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one reading, evicting the oldest point once over capacity.
    pub fn push(&mut self, reading: &SensorReading, label: impl Into<String>) {
        // ---
        self.temperature.push_back(reading.temperature);
        self.humidity.push_back(reading.humidity);
        self.soil_moisture.push_back(reading.soil_moisture);
        self.labels.push_back(label.into());

        if self.labels.len() > ROLLING_CAPACITY {
            self.temperature.pop_front();
            self.humidity.pop_front();
            self.soil_moisture.pop_front();
            self.labels.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn temperature(&self) -> Vec<f64> {
        self.temperature.iter().copied().collect()
    }

    pub fn humidity(&self) -> Vec<f64> {
        self.humidity.iter().copied().collect()
    }

    pub fn soil_moisture(&self) -> Vec<f64> {
        self.soil_moisture.iter().copied().collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }
}
