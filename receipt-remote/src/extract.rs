//! Extraction client: base64 receipt image -> ExpenseRecord via an AI provider.
//!
//! One HTTP request per image. No retries; transport errors surface as-is.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use receipt_core::ExpenseRecord;
use receipt_core::time::{today, today_in};
use receipt_ingest::interpret_ai_output;

use crate::error::ExtractionError;

const EXTRACTION_PROMPT: &str = "Extract description (string), amount (number), \
category (one of: entertainment, groceries, food&drink, housing, transport), \
merchant (string) and date (YYYY-MM-DD) from this receipt. Output valid JSON only.";

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, image_base64: &str) -> Result<ExpenseRecord, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "openai")]
    OpenAI,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::HuggingFace => "huggingface",
            Provider::OpenAI => "openai",
        }
    }

    pub fn key_env(self) -> &'static str {
        match self {
            Provider::HuggingFace => "HUGGINGFACE_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Run the text normalizer when the provider answers with plain text
    pub text_fallback: bool,
    /// IANA zone used for "today"; local zone when unset
    pub timezone: Option<String>,
}

/// Extractor backed by a hosted model over HTTP.
pub struct HttpExtractor {
    client: reqwest::Client,
    cfg: ExtractorConfig,
}

impl HttpExtractor {
    pub fn new(cfg: ExtractorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cfg,
        }
    }

    fn api_key(&self) -> Result<&str, ExtractionError> {
        self.cfg
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ExtractionError::MissingCredentials(self.cfg.provider.key_env()))
    }

    async fn huggingface_generate(&self, image_base64: &str) -> Result<String, ExtractionError> {
        let key = self.api_key()?;
        let provider = Provider::HuggingFace.name();
        let url = format!(
            "{}/models/{}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        );

        let resp = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&huggingface_request(image_base64))
            .send()
            .await
            .map_err(|source| ExtractionError::Transport { provider, source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Provider {
                provider,
                status: status.as_u16(),
                body,
            });
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|source| ExtractionError::Transport { provider, source })?;
        generated_text(&v)
            .ok_or_else(|| ExtractionError::Unparseable(format!("no generated_text in {v}")))
    }

    async fn openai_generate(&self, image_base64: &str) -> Result<String, ExtractionError> {
        let key = self.api_key()?;
        let provider = Provider::OpenAI.name();

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| ExtractionError::MissingCredentials(Provider::OpenAI.key_env()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.cfg.base_url.trim_end_matches('/')
            ))
            .headers(headers)
            .json(&openai_request(&self.cfg.model, image_base64))
            .send()
            .await
            .map_err(|source| ExtractionError::Transport { provider, source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Provider {
                provider,
                status: status.as_u16(),
                body,
            });
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|source| ExtractionError::Transport { provider, source })?;
        Ok(out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn extract(&self, image_base64: &str) -> Result<ExpenseRecord, ExtractionError> {
        tracing::info!(
            provider = self.cfg.provider.name(),
            model = %self.cfg.model,
            bytes = image_base64.len(),
            "analyzing receipt"
        );

        let content = match self.cfg.provider {
            Provider::HuggingFace => self.huggingface_generate(image_base64).await?,
            Provider::OpenAI => self.openai_generate(image_base64).await?,
        };
        tracing::debug!(%content, "provider response");

        let today = today_in(self.cfg.timezone.as_deref()).unwrap_or_else(|_| today());
        let record = interpret_ai_output(&content, today, self.cfg.text_fallback)?;
        tracing::info!(
            description = %record.description,
            amount = record.amount,
            category = %record.category,
            "receipt analyzed"
        );
        Ok(record)
    }
}

fn huggingface_request(image_base64: &str) -> Value {
    json!({ "inputs": format!("{EXTRACTION_PROMPT} Base64 image: {image_base64}") })
}

fn openai_request(model: &str, image_base64: &str) -> Value {
    let data_url = format!("data:{};base64,{}", image_mime(image_base64), image_base64);
    json!({
        "model": model,
        "temperature": 0.0,
        "messages": [
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": EXTRACTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }
        ]
    })
}

/// `generated_text` from either `{..}` or `[{..}]` inference responses.
fn generated_text(v: &Value) -> Option<String> {
    let obj = match v {
        Value::Array(items) => items.first()?,
        other => other,
    };
    obj.get("generated_text")
        .and_then(|t| t.as_str())
        .map(str::to_string)
}

/// MIME type sniffed from the first base64 characters.
fn image_mime(image_base64: &str) -> &'static str {
    let head = image_base64.trim_start();
    if head.starts_with("iVBOR") {
        "image/png"
    } else if head.starts_with("R0lGOD") {
        "image/gif"
    } else if head.starts_with("UklGR") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(provider: Provider, api_key: Option<&str>) -> ExtractorConfig {
        ExtractorConfig {
            provider,
            model: "google/flan-t5-small".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: api_key.map(str::to_string),
            text_fallback: true,
            timezone: None,
        }
    }

    #[test]
    fn test_generated_text_shapes() {
        assert_eq!(
            generated_text(&json!({"generated_text": "{}"})).as_deref(),
            Some("{}")
        );
        assert_eq!(
            generated_text(&json!([{"generated_text": "Swiggy ₹40"}])).as_deref(),
            Some("Swiggy ₹40")
        );
        assert_eq!(generated_text(&json!({"error": "loading"})), None);
        assert_eq!(generated_text(&json!([])), None);
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime("iVBORw0KGgo"), "image/png");
        assert_eq!(image_mime("/9j/4AAQ"), "image/jpeg");
        assert_eq!(image_mime("UklGRlYAAABXRUJQ"), "image/webp");
    }

    #[test]
    fn test_request_bodies() {
        let hf = huggingface_request("AAAA");
        assert!(hf["inputs"].as_str().unwrap().ends_with("Base64 image: AAAA"));

        let oai = openai_request("gpt-4o-mini", "iVBORAAAA");
        assert_eq!(oai["model"], "gpt-4o-mini");
        assert_eq!(
            oai["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/png;base64,iVBORAAAA"
        );
    }

    #[test]
    fn test_provider_serde_names() {
        let p: Provider = serde_json::from_str("\"huggingface\"").unwrap();
        assert_eq!(p, Provider::HuggingFace);
        assert_eq!(serde_json::to_string(&Provider::OpenAI).unwrap(), "\"openai\"");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        for provider in [Provider::HuggingFace, Provider::OpenAI] {
            let ex = HttpExtractor::new(cfg(provider, None));
            let err = ex.extract("AAAA").await.unwrap_err();
            assert!(
                matches!(err, ExtractionError::MissingCredentials(k) if k == provider.key_env()),
                "{err}"
            );
        }

        let blank = HttpExtractor::new(cfg(Provider::HuggingFace, Some("  ")));
        assert!(matches!(
            blank.extract("AAAA").await,
            Err(ExtractionError::MissingCredentials(_))
        ));
    }
}
