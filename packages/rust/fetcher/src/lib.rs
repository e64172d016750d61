//! Outbound content retrieval for registered JavaScript files.
//!
//! A [`Fetcher`] performs a single HTTP GET with redirect-following and a
//! bounded timeout, and returns either the response body as text or a typed
//! [`FetchError`]. It never touches the record store; interpreting a fetch
//! result is the registry's job.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use scriptwatch_shared::{FetchConfig, Result, ScriptwatchError};

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("scriptwatch/", env!("CARGO_PKG_VERSION"));

/// A failed outbound fetch.
///
/// Never propagated as a [`ScriptwatchError`]: the registry recovers from
/// every kind by falling back to the previously stored content.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or was lost mid-transfer.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The remote answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
}

/// Single-shot HTTP content fetcher with a shared connection pool.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher from the `[fetch]` config section.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScriptwatchError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `url` and return the response body decoded as text.
    ///
    /// Redirects are followed up to the configured limit; the body is read
    /// whole, with no size cap.
    pub async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        debug!(%url, "fetching content");

        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(classify)
    }
}

/// Map a transport-level reqwest error onto a [`FetchError`] kind.
fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Connection(e.to_string())
    }
}
