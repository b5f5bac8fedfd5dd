// src/error.rs
// =============================================================================
// Error type shared by the crawl engine and its transports.
//
// Only an invalid seed URL is fatal to a job. The fetch-level variants
// (Http, Status, NotHtml) are produced inside the fetchers and absorbed there,
// so callers normally only see InvalidSeed, Cancelled or Failed.
//
// Rust concepts:
// - thiserror: Derives std::error::Error and Display from attributes
// - #[from]: Lets `?` convert reqwest/tokio errors automatically
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed URL could not be parsed or has no host
    #[error("Invalid URL provided: {0}")]
    InvalidSeed(String),

    /// Network-level failure (DNS, connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("HTTP {0}")]
    Status(u16),

    /// Response was not an HTML page
    #[error("unexpected content type: {0}")]
    NotHtml(String),

    /// The consumer cancelled the job or stopped listening
    #[error("crawl cancelled")]
    Cancelled,

    /// The job reported an Error event
    #[error("crawl failed: {0}")]
    Failed(String),

    /// The engine task panicked or was aborted
    #[error("crawl task ended abnormally: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CrawlError {
    /// True for the error a caller sees after stopping a job itself
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CrawlError::Cancelled)
    }
}
