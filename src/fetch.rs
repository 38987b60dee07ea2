//! Outbound JSON requests and the mock-data fallback combinator.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::FetchError;

// ---

/// Send `request` and decode a JSON body of type `T`.
///
/// Connection failures, non-2xx statuses and undecodable bodies each map to
/// their own [`FetchError`] variant, but callers treat them all the same.
pub async fn fetch_json<T>(request: RequestBuilder, url: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    // ---
    let response = request.send().await.map_err(|source| FetchError::Network {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    response.json::<T>().await.map_err(|source| FetchError::Parse {
        url: url.to_string(),
        source,
    })
}

/// Uniform "use mock data on failure" step applied at every call site.
pub trait FetchResultExt<T> {
    /// Return the fetched value, or log a diagnostic and build a fallback.
    fn use_fallback<F>(self, what: &str, fallback: F) -> T
    where
        F: FnOnce() -> T;
}

impl<T> FetchResultExt<T> for Result<T, FetchError> {
    fn use_fallback<F>(self, what: &str, fallback: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Error fetching {}: {} (showing mock data)", what, e);
                fallback()
            }
        }
    }
}
