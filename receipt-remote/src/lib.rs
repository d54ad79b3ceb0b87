//! receipt-remote: AI extraction client, Notion sync client and the request rate limiter

pub mod error;
pub mod extract;
pub mod gateway;
pub mod notion;
pub mod rate_limit;

pub use error::{ExtractionError, RateLimitError, SyncError, SyncFailure};
pub use extract::{Extractor, ExtractorConfig, HttpExtractor, Provider};
pub use gateway::SyncGateway;
pub use notion::{ExpenseSink, NotionClient};
pub use rate_limit::RateLimiter;
