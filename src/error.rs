//! Error types shared by the dashboard controllers.
//!
//! Network-facing controllers never surface a [`FetchError`] to the user;
//! they swap in mock data through [`crate::fetch::FetchResultExt`]. Storage
//! errors, on the other hand, propagate to whoever triggered the write.

use reqwest::StatusCode;

// ---

/// Failure of one outbound HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, reset, ...).
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-success status.
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },

    /// The body was not the JSON shape we expected.
    #[error("unexpected response body from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A keyed service was called without a configured key.
    #[error("no API key configured for {service}")]
    MissingApiKey { service: &'static str },
}

/// Failure of the durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored value under `key` is not valid JSON for its type.
    #[error("stored value for {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Invalid calculator form input.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FormError {
    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unknown area unit {0:?} (expected \"sqm\" or \"acre\")")]
    UnknownAreaUnit(String),
}

/// A history column name that the table cannot sort by.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown history column {0:?}")]
pub struct UnknownColumn(pub String);

/// A page name outside the fixed navigation set.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown page {0:?}")]
pub struct UnknownPage(pub String);
