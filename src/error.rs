//! Error types for scraping and feed assembly.
//!
//! Only an invalid source URL is fatal: a feed cannot be built without a
//! valid source identity. Transport and status errors are per-fetch and
//! recoverable — the affected item is dropped and the batch continues.

use thiserror::Error;

/// Errors raised while fetching documents or constructing a scraper.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network or connection failure while fetching a page.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("status code error: {status} fetching {url}")]
    Status {
        /// The numeric HTTP status returned by the server.
        status: reqwest::StatusCode,
        /// The URL that produced the response.
        url: String,
    },

    /// A URL could not be parsed.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl ScrapeError {
    /// True for per-fetch failures that drop a single item rather than
    /// aborting the batch.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ScrapeError::InvalidUrl { .. })
    }
}
