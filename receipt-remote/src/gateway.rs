//! Sync gateway: the rate limiter in front of an [`ExpenseSink`].

use std::sync::Arc;

use receipt_core::ExpenseRecord;

use crate::error::{RateLimitError, SyncError, SyncFailure};
use crate::notion::ExpenseSink;
use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct SyncGateway {
    limiter: Arc<RateLimiter>,
    sink: Option<Arc<dyn ExpenseSink>>,
}

impl SyncGateway {
    /// `sink` is `None` when the destination is not configured.
    pub fn new(limiter: Arc<RateLimiter>, sink: Option<Arc<dyn ExpenseSink>>) -> Self {
        Self { limiter, sink }
    }

    pub fn is_configured(&self) -> bool {
        self.sink.is_some()
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Count one request against the caller's quota.
    pub fn admit(&self, identifier: &str) -> Result<(), RateLimitError> {
        self.limiter.check(identifier)
    }

    /// Push without touching the quota.
    pub async fn push(&self, record: &ExpenseRecord) -> Result<String, SyncError> {
        let sink = self.sink.as_ref().ok_or(SyncError::NotConfigured)?;
        sink.push(record).await
    }

    /// Check the caller's quota, then push. Neither step is retried.
    pub async fn sync(
        &self,
        identifier: &str,
        record: &ExpenseRecord,
    ) -> Result<String, SyncFailure> {
        self.admit(identifier)?;
        Ok(self.push(record).await?)
    }
}
