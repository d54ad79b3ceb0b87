//! One batch of receipts: accept files, extract in waves, edit, sync.
//!
//! Every accepted file is registered as `pending` before any extraction
//! starts. Failures stay on the entry (status `error` plus a message) and
//! never stop the rest of the batch.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;

use receipt_core::{ExpenseRecord, ExpenseStore, run_in_waves};
use receipt_remote::{ExpenseSink, Extractor};

/// An image handed to the session.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    /// Already base64-encoded bytes (e.g. from an upload)
    Encoded { name: String, base64: String },
}

impl ImageSource {
    pub fn name(&self) -> String {
        match self {
            ImageSource::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string()),
            ImageSource::Encoded { name, .. } => name.clone(),
        }
    }

    /// Standard base64 of the image bytes.
    pub async fn load_base64(&self) -> Result<String> {
        match self {
            ImageSource::Path(p) => {
                let bytes = tokio::fs::read(p)
                    .await
                    .with_context(|| format!("read {}", p.display()))?;
                Ok(STANDARD.encode(bytes))
            }
            ImageSource::Encoded { base64, .. } => Ok(base64.clone()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub synced: usize,
    pub failed: usize,
}

pub struct Session {
    store: ExpenseStore,
    extractor: Arc<dyn Extractor>,
    sink: Option<Arc<dyn ExpenseSink>>,
    wave_size: usize,
    today: NaiveDate,
}

impl Session {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        sink: Option<Arc<dyn ExpenseSink>>,
        wave_size: usize,
        today: NaiveDate,
    ) -> Self {
        Self {
            store: ExpenseStore::new(),
            extractor,
            sink,
            wave_size,
            today,
        }
    }

    pub fn store(&self) -> &ExpenseStore {
        &self.store
    }

    pub fn sync_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Register every source as pending, then extract them in waves.
    /// Returns the new ids in input order.
    pub async fn accept(&self, sources: Vec<ImageSource>) -> Vec<String> {
        let jobs: Vec<(String, ImageSource)> = sources
            .into_iter()
            .map(|src| (self.store.add_pending(&src.name(), self.today), src))
            .collect();
        let ids: Vec<String> = jobs.iter().map(|(id, _)| id.clone()).collect();

        tracing::info!(files = jobs.len(), wave_size = self.wave_size, "extracting receipts");
        run_in_waves(jobs, self.wave_size, move |(id, src)| self.extract_one(id, src)).await;
        ids
    }

    async fn extract_one(&self, id: String, src: ImageSource) {
        let name = src.name();
        let outcome = match src.load_base64().await {
            Ok(b64) => self
                .extractor
                .extract(&b64)
                .await
                .map_err(|e| format!("Failed to extract data from image: {e}")),
            Err(e) => Err(format!("Failed to read image: {e:#}")),
        };

        let stored = match outcome {
            Ok(record) => self
                .store
                .mark_extracted(&id, record.with_source_file(name.as_str())),
            Err(message) => {
                tracing::warn!(file = %name, error = %message, "extraction failed");
                self.store.mark_failed(&id, message)
            }
        };
        if let Err(e) = stored {
            tracing::error!(%id, error = %e, "could not record extraction result");
        }
    }

    pub fn edit(&self, id: &str, record: ExpenseRecord) -> Result<()> {
        self.store.edit(id, record)?;
        Ok(())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.store.remove(id)
    }

    /// Push one entry. On failure the entry moves to `error` and stays editable.
    pub async fn sync_one(&self, id: &str) -> Result<String> {
        let Some(sink) = &self.sink else {
            bail!("Notion is not configured");
        };
        let record = self.store.begin_sync(id)?;

        match sink.push(&record).await {
            Ok(page_id) => {
                self.store.mark_synced(id)?;
                Ok(page_id)
            }
            Err(e) => {
                let message = format!("Failed to sync with Notion: {e}");
                self.store.mark_failed(id, message.as_str())?;
                bail!(message)
            }
        }
    }

    /// Push every extracted or edited entry, one at a time.
    pub async fn sync_all(&self) -> Result<SyncSummary> {
        if self.sink.is_none() {
            bail!("Notion is not configured (set NOTION_TOKEN and NOTION_DATABASE_ID)");
        }

        let mut summary = SyncSummary::default();
        for id in self.store.syncable_ids() {
            match self.sync_one(&id).await {
                Ok(page_id) => {
                    tracing::debug!(%id, %page_id, "synced");
                    summary.synced += 1;
                }
                Err(e) => {
                    tracing::warn!(%id, error = %e, "sync failed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }
}
