use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$LEDGERLINK_HOME`, or `~/.ledgerlink`.
pub fn ledgerlink_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("LEDGERLINK_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".ledgerlink"))
}

pub fn ensure_ledgerlink_home() -> Result<PathBuf> {
    let dir = ledgerlink_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
