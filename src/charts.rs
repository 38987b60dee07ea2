//! Chart registry: owns every chart's bound data and lifecycle.
//!
//! Drawing is the front end's job. The registry records what each chart
//! shows, which instance it is (`id`), and how many times it was redrawn,
//! so a client can tell an in-place update from a destroy-and-recreate.

use std::collections::BTreeMap;

use serde::Serialize;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Overview,
    Temperature,
    Humidity,
    Soil,
    Forecast,
    Comparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
}

/// How a chart reacts to new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created once, then updated in place.
    InPlace,
    /// Destroyed and created again on every render.
    Recreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: &'static str,
    pub data: Vec<f64>,
    pub border_color: &'static str,
    pub background_color: &'static str,
    pub fill: bool,
    pub axis: Axis,
    /// Per-point colours, for soil bands and bar fills.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub point_colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: u64,
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub dual_axis: bool,
    pub redraws: u64,
}

/// New data for a chart: x labels plus one series per dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Serialize)]
pub struct ChartRegistry {
    charts: BTreeMap<ChartKind, Chart>,
    #[serde(skip)]
    next_id: u64,
}

struct SeriesStyle {
    label: &'static str,
    border: &'static str,
    background: &'static str,
    fill: bool,
    axis: Axis,
}

const TEMPERATURE: &str = "Temperature (°C)";
const HUMIDITY: &str = "Humidity (%)";
const SOIL: &str = "Soil Moisture (%)";

const RED: &str = "#ff6b6b";
const BLUE: &str = "#4facfe";
const GREEN: &str = "#43e97b";

// ---

impl ChartKind {
    pub const LIVE: [ChartKind; 4] = [
        ChartKind::Overview,
        ChartKind::Temperature,
        ChartKind::Humidity,
        ChartKind::Soil,
    ];

    pub fn lifecycle(self) -> Lifecycle {
        match self {
            ChartKind::Comparison => Lifecycle::Recreate,
            _ => Lifecycle::InPlace,
        }
    }

    fn chart_type(self) -> ChartType {
        match self {
            ChartKind::Comparison => ChartType::Bar,
            _ => ChartType::Line,
        }
    }

    fn styles(self) -> Vec<SeriesStyle> {
        // ---
        let line = |label, border, background, fill, axis| SeriesStyle {
            label,
            border,
            background,
            fill,
            axis,
        };
        match self {
            ChartKind::Overview => vec![
                line(TEMPERATURE, RED, "rgba(255, 107, 107, 0.1)", false, Axis::Primary),
                line(HUMIDITY, BLUE, "rgba(79, 172, 254, 0.1)", false, Axis::Primary),
                line(SOIL, GREEN, "rgba(67, 233, 123, 0.1)", false, Axis::Primary),
            ],
            ChartKind::Temperature => {
                vec![line(TEMPERATURE, RED, "rgba(255, 107, 107, 0.2)", true, Axis::Primary)]
            }
            ChartKind::Humidity => {
                vec![line(HUMIDITY, BLUE, "rgba(79, 172, 254, 0.2)", true, Axis::Primary)]
            }
            ChartKind::Soil => {
                vec![line(SOIL, GREEN, "rgba(67, 233, 123, 0.2)", true, Axis::Primary)]
            }
            ChartKind::Forecast => vec![
                line(TEMPERATURE, RED, "rgba(255, 107, 107, 0.1)", false, Axis::Primary),
                line(HUMIDITY, BLUE, "rgba(79, 172, 254, 0.1)", false, Axis::Secondary),
            ],
            ChartKind::Comparison => vec![line(
                "Water Usage (liters)",
                "#0099cc",
                "rgba(0, 153, 204, 0.7)",
                true,
                Axis::Primary,
            )],
        }
    }

    /// Per-point colours derived from the data.
    fn point_colors(self, data: &[f64]) -> Vec<&'static str> {
        match self {
            ChartKind::Soil => data.iter().map(|v| soil_band_color(*v)).collect(),
            ChartKind::Comparison => vec!["rgba(0, 153, 204, 0.7)", "rgba(39, 174, 96, 0.7)"]
                .into_iter()
                .take(data.len())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Line colour for a soil moisture value: healthy, dry-ish, or out of band.
pub fn soil_band_color(value: f64) -> &'static str {
    // ---
    if (50.0..=70.0).contains(&value) {
        "#27ae60"
    } else if (30.0..50.0).contains(&value) {
        "#f39c12"
    } else {
        "#e74c3c"
    }
}

impl ChartRegistry {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ChartKind) -> Option<&Chart> {
        self.charts.get(&kind)
    }

    /// Bind `data` to the chart of `kind`, creating it if needed.
    ///
    /// In-place charts keep their id and count one more redraw; recreated
    /// charts get a fresh id with the redraw counter reset.
    pub fn render_or_update(&mut self, kind: ChartKind, data: ChartData) -> &Chart {
        // ---
        let datasets = build_datasets(kind, data.series);

        let existing = match kind.lifecycle() {
            Lifecycle::InPlace => self.charts.get(&kind).map(|c| (c.id, c.redraws)),
            Lifecycle::Recreate => {
                if let Some(old) = self.charts.remove(&kind) {
                    tracing::debug!("Destroyed {:?} chart #{}", kind, old.id);
                }
                None
            }
        };

        let (id, redraws) = match existing {
            Some((id, redraws)) => (id, redraws + 1),
            None => {
                self.next_id += 1;
                tracing::debug!("Created {:?} chart #{}", kind, self.next_id);
                (self.next_id, 1)
            }
        };

        let chart = Chart {
            id,
            chart_type: kind.chart_type(),
            labels: data.labels,
            datasets,
            dual_axis: kind == ChartKind::Forecast,
            redraws,
        };
        self.charts.insert(kind, chart);
        &self.charts[&kind]
    }

    /// Redraw every live chart from its currently bound data.
    pub fn redraw_all(&mut self) -> usize {
        // ---
        for chart in self.charts.values_mut() {
            chart.redraws += 1;
        }
        self.charts.len()
    }
}

fn build_datasets(kind: ChartKind, series: Vec<Vec<f64>>) -> Vec<Dataset> {
    // ---
    kind.styles()
        .into_iter()
        .zip(series.into_iter().chain(std::iter::repeat_with(Vec::new)))
        .map(|(style, data)| Dataset {
            label: style.label,
            point_colors: kind.point_colors(&data),
            data,
            border_color: style.border,
            background_color: style.background,
            fill: style.fill,
            axis: style.axis,
        })
        .collect()
}
