//! History table: the persisted, newest-first list of past readings.
//!
//! The table keeps the full list in memory, mirrors it to [`Storage`] on
//! every append, and tracks what the table body currently shows. Filtering
//! only changes the visible body; sorting reorders the list itself.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::display::parse_timestamp;
use crate::error::{StorageError, UnknownColumn};
use crate::models::HistoryEntry;
use crate::storage::{Storage, HISTORY_KEY};

// ---

/// Maximum number of stored rows.
pub const HISTORY_CAPACITY: usize = 100;

pub const CSV_HEADER: [&str; 5] = [
    "Timestamp",
    "Temperature (°C)",
    "Humidity (%)",
    "Soil Moisture (%)",
    "Footprint (L)",
];

/// What the table body currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum TableBody {
    /// Single "No historical data available" row.
    Placeholder,
    Rows(Vec<HistoryEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Timestamp,
    Temperature,
    Humidity,
    SoilMoisture,
    Footprint,
}

/// A finished CSV download.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct HistoryTable {
    entries: Vec<HistoryEntry>,
    body: TableBody,
    #[serde(skip)]
    storage: Box<dyn Storage>,
}

impl HistoryTable {
    // ---
    /// Load the stored list (if any) and render it.
    pub fn load(storage: Box<dyn Storage>) -> Result<Self, StorageError> {
        // ---
        let entries = match storage.get_item(HISTORY_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<HistoryEntry>>(&raw).map_err(|source| {
                StorageError::Corrupt {
                    key: HISTORY_KEY.to_string(),
                    source,
                }
            })?,
            None => Vec::new(),
        };

        tracing::info!("Loaded {} history entries", entries.len());

        let mut table = HistoryTable {
            entries,
            body: TableBody::Placeholder,
            storage,
        };
        table.render();
        Ok(table)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn body(&self) -> &TableBody {
        &self.body
    }

    /// Insert a new row at the front, drop the oldest beyond capacity,
    /// persist, and re-render the full list.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), StorageError> {
        // ---
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);

        let encoded = serde_json::to_string(&self.entries)?;
        self.storage.set_item(HISTORY_KEY, &encoded)?;

        self.render();
        Ok(())
    }

    /// Show every row, or the placeholder when there are none.
    pub fn render(&mut self) -> &TableBody {
        // ---
        self.body = if self.entries.is_empty() {
            TableBody::Placeholder
        } else {
            TableBody::Rows(self.entries.clone())
        };
        &self.body
    }

    /// Show rows where any field contains `term`, ignoring case.
    ///
    /// Zero matches yield an empty body; the placeholder only appears when
    /// the list itself is empty.
    pub fn filter(&mut self, term: &str) -> &TableBody {
        // ---
        if self.entries.is_empty() {
            self.body = TableBody::Placeholder;
            return &self.body;
        }

        let needle = term.to_lowercase();
        let rows = self
            .entries
            .iter()
            .filter(|entry| {
                entry
                    .fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        self.body = TableBody::Rows(rows);
        &self.body
    }

    /// Reorder the list by `column`, largest first, and re-render.
    ///
    /// Values that do not parse sort after all parseable ones.
    pub fn sort(&mut self, column: SortColumn) -> &TableBody {
        // ---
        match column {
            SortColumn::Timestamp => self.entries.sort_by(|a, b| {
                descending(parse_timestamp(&a.timestamp), parse_timestamp(&b.timestamp))
            }),
            _ => self.entries.sort_by(|a, b| {
                let a = column.numeric_value(a);
                let b = column.numeric_value(b);
                descending(a, b)
            }),
        }
        self.render()
    }

    /// Serialize the full in-memory list (ignoring any filter) as CSV.
    pub fn export_csv(&self, today: NaiveDate) -> Result<CsvExport, csv::Error> {
        // ---
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(CSV_HEADER)?;
        for entry in &self.entries {
            writer.write_record(entry.fields())?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;

        Ok(CsvExport {
            filename: format!("water-footprint-history-{}.csv", today.format("%Y-%m-%d")),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl SortColumn {
    fn numeric_value(self, entry: &HistoryEntry) -> Option<f64> {
        // ---
        let raw = match self {
            SortColumn::Timestamp => &entry.timestamp,
            SortColumn::Temperature => &entry.temperature,
            SortColumn::Humidity => &entry.humidity,
            SortColumn::SoilMoisture => &entry.soil_moisture,
            SortColumn::Footprint => &entry.footprint,
        };
        raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
    }
}

impl std::str::FromStr for SortColumn {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(SortColumn::Timestamp),
            "temperature" => Ok(SortColumn::Temperature),
            "humidity" => Ok(SortColumn::Humidity),
            "soil_moisture" => Ok(SortColumn::SoilMoisture),
            "footprint" => Ok(SortColumn::Footprint),
            other => Err(UnknownColumn(other.to_string())),
        }
    }
}

/// Descending order with `None` last.
fn descending<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    // ---
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
