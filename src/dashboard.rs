//! Application state: everything the dashboard shows, in one struct.
//!
//! Controllers never keep their own globals. Timers and HTTP handlers share
//! one [`AppState`], fetch outside the lock, then apply results to the
//! [`Dashboard`] under it. There is no request sequencing: when two
//! responses race, the last one applied wins.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::charts::{ChartData, ChartKind, ChartRegistry};
use crate::display::{format_clock, time_label};
use crate::error::{StorageError, UnknownPage};
use crate::footprint::{CalculatorPanel, FootprintPhase, FootprintView};
use crate::history::HistoryTable;
use crate::models::{FootprintResult, PreviousValues, SensorReading, SensorSnapshot, Trend};
use crate::rolling::RollingHistory;
use crate::storage::Storage;
use crate::weather::{CurrentConditions, DailyForecast};
use crate::Config;

// ---

/// Shared handle passed to every controller, timer, and route.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Mutex<Dashboard>>,
    pub client: reqwest::Client,
    pub config: Config,
}

impl AppState {
    pub fn new(dashboard: Dashboard, config: Config) -> Self {
        // ---
        AppState {
            dashboard: Arc::new(Mutex::new(dashboard)),
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// One metric card: displayed text plus its trend arrow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub text: String,
    pub unit: &'static str,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCards {
    pub temperature: MetricCard,
    pub humidity: MetricCard,
    pub soil_moisture: MetricCard,
    /// Overview weather card; always reads "Clear".
    pub weather: &'static str,
}

/// Navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Analytics,
    Calculator,
    Weather,
    History,
}

#[derive(Serialize)]
pub struct Dashboard {
    pub page: Page,
    pub heading: String,
    pub clock: String,
    pub location: String,
    pub cards: MetricCards,
    pub previous: PreviousValues,
    pub rolling: RollingHistory,
    pub charts: ChartRegistry,
    pub history: HistoryTable,
    pub weather: Option<CurrentConditions>,
    pub calculator: CalculatorPanel,
}

// ---

impl MetricCard {
    fn empty(unit: &'static str) -> Self {
        MetricCard {
            text: "--".to_string(),
            unit,
            trend: Trend::Unchanged,
        }
    }

    /// Show `value` and move the arrow relative to `previous`.
    fn show(&mut self, value: f64, previous: Option<f64>) {
        // ---
        self.text = format!("{:.1}", value);
        if let Some(trend) = Trend::between(previous, value) {
            self.trend = trend;
        }
    }

    /// The value as currently displayed, if any.
    pub fn displayed_value(&self) -> Option<f64> {
        self.text.parse().ok()
    }
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Analytics,
        Page::Calculator,
        Page::Weather,
        Page::History,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Analytics => "analytics",
            Page::Calculator => "calculator",
            Page::Weather => "weather",
            Page::History => "history",
        }
    }

    /// Heading text: the page name, capitalised.
    pub fn title(self) -> String {
        // ---
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl std::str::FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPage(s.to_string()))
    }
}

impl Dashboard {
    // ---
    /// Build the initial state, loading persisted history from `storage`.
    pub fn init(storage: Box<dyn Storage>) -> Result<Self, StorageError> {
        // ---
        let history = HistoryTable::load(storage)?;

        Ok(Dashboard {
            page: Page::Dashboard,
            heading: Page::Dashboard.title(),
            clock: String::new(),
            location: String::new(),
            cards: MetricCards {
                temperature: MetricCard::empty("°C"),
                humidity: MetricCard::empty("%"),
                soil_moisture: MetricCard::empty("%"),
                weather: "Clear",
            },
            previous: PreviousValues::default(),
            rolling: RollingHistory::new(),
            charts: ChartRegistry::new(),
            history,
            weather: None,
            calculator: CalculatorPanel::default(),
        })
    }

    /// Push a reading through cards, trends, rolling buffer, live charts, and
    /// history, with a placeholder footprint for the history row.
    pub fn apply_reading(&mut self, reading: &SensorReading) -> Result<(), StorageError> {
        // ---
        self.update_cards(reading);

        let label = match reading.parsed_timestamp() {
            Some(t) => time_label(&t.with_timezone(&Local)),
            None => reading.timestamp.clone(),
        };
        self.rolling.push(reading, label);
        self.redraw_live_charts();

        self.history.append(reading.to_history_entry(placeholder_footprint()))
    }

    fn update_cards(&mut self, reading: &SensorReading) {
        // ---
        let cards = &mut self.cards;
        let previous = &mut self.previous;

        cards.temperature.show(reading.temperature, previous.temperature);
        cards.humidity.show(reading.humidity, previous.humidity);
        cards.soil_moisture.show(reading.soil_moisture, previous.soil_moisture);

        previous.temperature = Some(reading.temperature);
        previous.humidity = Some(reading.humidity);
        previous.soil_moisture = Some(reading.soil_moisture);
    }

    fn redraw_live_charts(&mut self) {
        // ---
        let labels = self.rolling.labels();
        let temperature = self.rolling.temperature();
        let humidity = self.rolling.humidity();
        let soil = self.rolling.soil_moisture();

        let bind = |series: Vec<Vec<f64>>| ChartData {
            labels: labels.clone(),
            series,
        };

        self.charts.render_or_update(
            ChartKind::Overview,
            bind(vec![temperature.clone(), humidity.clone(), soil.clone()]),
        );
        self.charts
            .render_or_update(ChartKind::Temperature, bind(vec![temperature]));
        self.charts
            .render_or_update(ChartKind::Humidity, bind(vec![humidity]));
        self.charts.render_or_update(ChartKind::Soil, bind(vec![soil]));
    }

    /// Redraw every chart from its bound data; returns how many were redrawn.
    pub fn resync_charts(&mut self) -> usize {
        self.charts.redraw_all()
    }

    pub fn tick_clock<Tz>(&mut self, now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.clock = format_clock(now);
    }

    pub fn set_location(&mut self, label: String) {
        self.location = label;
    }

    /// Switch pages. Returns `true` when the new page needs a weather refresh.
    pub fn navigate(&mut self, page: Page) -> bool {
        // ---
        self.page = page;
        self.heading = page.title();
        tracing::debug!("Switched to page {}", page.name());
        page == Page::Weather
    }

    pub fn apply_weather(&mut self, conditions: CurrentConditions) {
        self.weather = Some(conditions);
    }

    pub fn apply_forecast(&mut self, forecast: DailyForecast) {
        // ---
        self.charts.render_or_update(
            ChartKind::Forecast,
            ChartData {
                labels: forecast.labels,
                series: vec![forecast.temperatures, forecast.humidity],
            },
        );
    }

    /// Sensor values as read back from the metric cards.
    pub fn sensor_snapshot(&self) -> SensorSnapshot {
        // ---
        SensorSnapshot {
            temperature: self.cards.temperature.displayed_value(),
            humidity: self.cards.humidity.displayed_value(),
            soil_moisture: self.cards.soil_moisture.displayed_value(),
        }
    }

    pub fn begin_calculation(&mut self) {
        self.calculator.phase = FootprintPhase::Submitted;
    }

    /// Render a calculator result and rebuild the comparison chart.
    pub fn show_footprint(&mut self, result: &FootprintResult) -> FootprintView {
        // ---
        let view = self.calculator.display(result);
        self.charts.render_or_update(
            ChartKind::Comparison,
            ChartData {
                labels: vec!["Actual Usage".to_string(), "Ideal Usage".to_string()],
                series: vec![vec![result.total_footprint, result.ideal_or_default()]],
            },
        );
        view
    }
}

/// Stand-in footprint recorded with each polled reading.
fn placeholder_footprint() -> u32 {
    fastrand::u32(10_000..15_000)
}
