use std::time::Duration;
use thiserror::Error;

use receipt_ingest::UnparseableOutput;

/// Failure while turning an image into an expense record.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("missing credentials: set {0}")]
    MissingCredentials(&'static str),

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} error {status}: {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("unparseable AI response: {0}")]
    Unparseable(String),
}

impl From<UnparseableOutput> for ExtractionError {
    fn from(e: UnparseableOutput) -> Self {
        ExtractionError::Unparseable(e.to_string())
    }
}

/// Failure while persisting a record to the destination database.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Notion is not configured")]
    NotConfigured,

    #[error("notion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notion rejected the page ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected notion response: {0}")]
    MalformedResponse(String),
}

/// Local request guard tripped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Too many requests")]
pub struct RateLimitError {
    pub identifier: String,
    /// Time until the oldest request in the window expires
    pub retry_after: Duration,
}

/// Outcome of a guarded sync request.
#[derive(Debug, Error)]
pub enum SyncFailure {
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
