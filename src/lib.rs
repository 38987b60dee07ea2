//! Water footprint dashboard service.
//!
//! Polls a sensor API, keeps a rolling window of readings bound to the live
//! charts, pulls weather and a 5-day forecast, runs the water footprint
//! calculator, and keeps a persisted history table with filter, sort, and
//! CSV export. Every network-facing controller falls back to mock data on
//! failure, so the dashboard always has something to show.
//!
//! Module layout follows the Explicit Module Boundary Pattern (EMBP): this
//! file is the only gateway, and siblings import each other through the
//! re-exports below rather than reaching into each other's internals.

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod fetch;
pub mod footprint;
pub mod history;
pub mod models;
pub mod rolling;
pub mod routes;
pub mod scheduler;
pub mod sensor;
pub mod storage;
pub mod weather;

pub use config::Config;
pub use dashboard::{AppState, Dashboard, Page};
pub use error::{FetchError, FormError, StorageError};
pub use history::{HistoryTable, SortColumn, TableBody};
pub use models::{
    AreaUnit, Efficiency, FootprintForm, FootprintRequest, FootprintResult, HistoryEntry,
    SensorReading, SensorSnapshot, Trend,
};
pub use scheduler::Scheduler;
pub use storage::{FileStorage, MemoryStorage, Storage};
