use anyhow::{Context, Result, bail};
use receipt_core::DEFAULT_WAVE_SIZE;
use receipt_remote::{ExtractorConfig, Provider};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::ensure_receipts_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA timezone for "today" (year of undated receipts); machine zone when unset
    pub timezone: Option<String>,
    pub extraction: ExtractionSection,
    pub notion: NotionSection,
    pub server: ServerSection,
    pub batch: BatchSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSection {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    /// Usually supplied via HUGGINGFACE_API_KEY / OPENAI_API_KEY instead
    pub api_key: Option<String>,
    /// Normalize plain-text answers instead of rejecting them
    pub text_fallback: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSection {
    pub token: Option<String>,
    pub database_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub addr: String,
    pub rate_limit_per_minute: usize,
    /// Idle client keys are evicted after this many seconds
    pub rate_limit_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    /// Extractions in flight per wave
    pub size: usize,
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            provider: Provider::HuggingFace,
            model: "google/flan-t5-small".to_string(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            api_key: None,
            text_fallback: true,
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            rate_limit_per_minute: 10,
            rate_limit_ttl_secs: 600,
        }
    }
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            size: DEFAULT_WAVE_SIZE,
        }
    }
}

impl Config {
    /// Overlay environment variables. `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(self.extraction.provider.key_env()) {
            self.extraction.api_key = Some(key);
        }
        if let Some(token) = get("NOTION_TOKEN") {
            self.notion.token = Some(token);
        }
        if let Some(db) = get("NOTION_DATABASE_ID") {
            self.notion.database_id = Some(db);
        }
        if let Some(addr) = get("RECEIPTS_ADDR") {
            self.server.addr = addr;
        }
        if let Some(tz) = get("RECEIPTS_TIMEZONE") {
            self.timezone = Some(tz);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(tz) = &self.timezone {
            if tz.parse::<chrono_tz::Tz>().is_err() {
                bail!("invalid timezone in config: {tz}");
            }
        }
        if self.batch.size == 0 {
            bail!("batch.size must be at least 1");
        }
        if self.server.rate_limit_per_minute == 0 {
            bail!("server.rate_limit_per_minute must be at least 1");
        }
        Ok(())
    }

    /// Sync is enabled only when both Notion credentials are present.
    pub fn notion_configured(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.notion.token) && set(&self.notion.database_id)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            provider: self.extraction.provider,
            model: self.extraction.model.clone(),
            base_url: self.extraction.base_url.clone(),
            api_key: self.extraction.api_key.clone(),
            text_fallback: self.extraction.text_fallback,
            timezone: self.timezone.clone(),
        }
    }

    pub fn rate_limit_ttl(&self) -> Duration {
        Duration::from_secs(self.server.rate_limit_ttl_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_receipts_home()?.join("config.toml"))
}

pub fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Config file (or defaults) overlaid with the environment, validated.
pub fn load_config() -> Result<Config> {
    let mut cfg = read_config(&config_path()?)?;
    cfg.apply_env(|k| std::env::var(k).ok());
    cfg.validate()?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Print the effective configuration with secrets masked.
pub fn check_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config()?;

    println!("Config file: {}{}", p.display(), if p.exists() { "" } else { " (not found, using defaults)" });
    println!("Timezone:    {}", cfg.timezone.as_deref().unwrap_or("(local)"));
    println!();
    println!("[extraction]");
    println!("  provider:      {}", cfg.extraction.provider.name());
    println!("  model:         {}", cfg.extraction.model);
    println!("  base_url:      {}", cfg.extraction.base_url);
    println!(
        "  api_key:       {}",
        cfg.extraction
            .api_key
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| format!("(missing; set {})", cfg.extraction.provider.key_env()))
    );
    println!("  text_fallback: {}", cfg.extraction.text_fallback);
    println!();
    println!("[notion]");
    println!(
        "  token:         {}",
        cfg.notion.token.as_deref().map(mask_secret).unwrap_or_else(|| "(missing; set NOTION_TOKEN)".to_string())
    );
    println!(
        "  database_id:   {}",
        cfg.notion.database_id.clone().unwrap_or_else(|| "(missing; set NOTION_DATABASE_ID)".to_string())
    );
    println!(
        "  sync:          {}",
        if cfg.notion_configured() { "enabled" } else { "disabled" }
    );
    println!();
    println!("[server]");
    println!("  addr:          {}", cfg.server.addr);
    println!("  rate limit:    {}/min per client", cfg.server.rate_limit_per_minute);
    println!();
    println!("[batch]");
    println!("  size:          {}", cfg.batch.size);
    Ok(())
}

/// Keep the first and last four characters of long secrets.
pub fn mask_secret(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
