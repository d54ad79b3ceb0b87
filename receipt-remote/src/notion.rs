//! Notion sync client: one page per expense in a database.
//!
//! Expected database properties:
//!   Expense (title) | #amount (number) | category (select) | date (date)

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{Value, json};

use receipt_core::ExpenseRecord;

use crate::error::SyncError;

pub const NOTION_API: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Destination for finalized expenses. Returns the created record's id.
#[async_trait]
pub trait ExpenseSink: Send + Sync {
    async fn push(&self, record: &ExpenseRecord) -> Result<String, SyncError>;
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    database_id: String,
    base_url: String,
}

impl NotionClient {
    /// Both credentials are required; blank values count as missing.
    pub fn from_credentials(
        token: Option<&str>,
        database_id: Option<&str>,
    ) -> Result<Self, SyncError> {
        let present = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        match (present(token), present(database_id)) {
            (Some(token), Some(database_id)) => Ok(Self {
                client: reqwest::Client::new(),
                token,
                database_id,
                base_url: NOTION_API.to_string(),
            }),
            _ => Err(SyncError::NotConfigured),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }
}

#[async_trait]
impl ExpenseSink for NotionClient {
    async fn push(&self, record: &ExpenseRecord) -> Result<String, SyncError> {
        #[derive(Deserialize)]
        struct Created {
            id: Option<String>,
        }

        let resp = self
            .client
            .post(format!("{}/v1/pages", self.base_url.trim_end_matches('/')))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
            .json(&page_request(&self.database_id, record))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let created: Created = resp.json().await?;
        let id = created
            .id
            .ok_or_else(|| SyncError::MalformedResponse("page id missing".to_string()))?;
        tracing::info!(page_id = %id, description = %record.description, "synced expense to notion");
        Ok(id)
    }
}

/// Body for `POST /v1/pages`.
pub fn page_request(database_id: &str, record: &ExpenseRecord) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Expense": {
                "title": [ { "text": { "content": record.description } } ]
            },
            "#amount": { "number": record.amount },
            "category": { "select": { "name": record.category.as_str() } },
            "date": { "date": { "start": record.iso_date() } }
        }
    })
}

/// Notion errors look like `{"object":"error","code":..,"message":..}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
