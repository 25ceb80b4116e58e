//! HTTP client scope for page fetching.
//!
//! Async reqwest driven through a shared tokio runtime behind a sync
//! interface; extractors run on a plain thread and block for the duration
//! of each page exchange.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout per attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from one page fetch: transport failure or non-2xx status.
#[derive(Debug)]
pub struct FetchError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(s) => write!(f, "HTTP {s}: {}", self.message),
            None => write!(f, "HTTP error: {}", self.message),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Create from a reqwest error, keeping the status when one exists.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Build a new HTTP client with its own connection pool.
///
/// Retrying callers must not reuse the pool of a failed attempt; each
/// attempt gets its own client.
pub fn fresh_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_with_status() {
        let err = FetchError {
            status: Some(500),
            message: "server error".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP 500: server error");
    }

    #[test]
    fn fetch_error_display_without_status() {
        let err = FetchError {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: connection refused");
    }
}
