use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$RECEIPTS_HOME`, else `~/.receipts`.
pub fn receipts_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("RECEIPTS_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".receipts"))
}

pub fn ensure_receipts_home() -> Result<PathBuf> {
    let dir = receipts_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
