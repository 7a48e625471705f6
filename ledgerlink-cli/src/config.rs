use anyhow::{Context, Result, bail};
use chrono::Utc;
use chrono_tz::Tz;
use ledgerlink_client::{BackendConfig, DEFAULT_LINK_UI_URL, LinkTokenMethod, LoaderConfig};
use ledgerlink_core::{BalancePreference, DateWindow, NormalizeOptions, RetryPolicy, SignConvention};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::ensure_ledgerlink_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSection,
    pub loader: LoaderSection,
    pub display: DisplaySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub base_url: String,
    /// Whose items and transactions to show; required by every data command
    pub user_id: Option<String>,
    pub request_timeout_ms: u64,
    pub link_token_method: LinkTokenMethod,
    pub link_ui_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSection {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    /// 0 keeps retrying until interrupted
    pub max_attempts: u32,
    /// 0 disables the per-round timeout
    pub attempt_timeout_ms: u64,
    /// `watch`: seconds between transaction refreshes
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// IANA zone used for date windows and timestamps
    pub timezone: String,
    pub sign_convention: SignConvention,
    pub balance_preference: BalancePreference,
    /// Default transaction window in days; 0 fetches everything
    pub days: u32,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            user_id: None,
            request_timeout_ms: 10_000,
            link_token_method: LinkTokenMethod::Get,
            link_ui_url: DEFAULT_LINK_UI_URL.to_string(),
        }
    }
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 5_000,
            max_backoff_ms: 60_000,
            multiplier: 2.0,
            max_attempts: 8,
            attempt_timeout_ms: 15_000,
            refresh_interval_secs: 60,
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            sign_convention: SignConvention::default(),
            balance_preference: BalancePreference::default(),
            days: 30,
        }
    }
}

impl Config {
    /// Command-line and environment values win over the file.
    pub fn apply_overrides(&mut self, api_url: Option<String>, user_id: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(user) = user_id.filter(|u| !u.trim().is_empty()) {
            self.backend.user_id = Some(user);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            bail!("[backend] base_url is empty");
        }
        if self.backend.request_timeout_ms == 0 {
            bail!("[backend] request_timeout_ms must be positive");
        }
        if !self.loader.multiplier.is_finite() || self.loader.multiplier < 1.0 {
            bail!("[loader] multiplier must be >= 1.0, got {}", self.loader.multiplier);
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.display
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("[display] timezone '{}' is not an IANA zone", self.display.timezone))
    }

    pub fn require_user(&self) -> Result<&str> {
        match self.backend.user_id.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => Ok(u),
            _ => bail!("no user id configured (pass --user, set LEDGERLINK_USER_ID, or set [backend] user_id)"),
        }
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.backend.base_url.clone(),
            request_timeout: Duration::from_millis(self.backend.request_timeout_ms),
            link_token_method: self.backend.link_token_method,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let l = &self.loader;
        RetryPolicy {
            initial_backoff: Duration::from_millis(l.initial_backoff_ms),
            max_backoff: Duration::from_millis(l.max_backoff_ms.max(l.initial_backoff_ms)),
            multiplier: l.multiplier,
            max_attempts: (l.max_attempts > 0).then_some(l.max_attempts),
            attempt_timeout: (l.attempt_timeout_ms > 0).then(|| Duration::from_millis(l.attempt_timeout_ms)),
        }
    }

    /// Loader settings for `user_id`. `days` overrides `[display] days`.
    pub fn loader_config(&self, user_id: &str, days: Option<u32>) -> Result<LoaderConfig> {
        let days = days.unwrap_or(self.display.days);
        let window = if days == 0 {
            None
        } else {
            Some(DateWindow::last_days(&self.display.timezone, days, Utc::now())?)
        };
        let mut cfg = LoaderConfig::new(user_id).with_policy(self.retry_policy());
        cfg.normalize = NormalizeOptions {
            balance_preference: self.display.balance_preference,
        };
        cfg.window = window;
        Ok(cfg)
    }
}

/// `--config` if given, else `~/.ledgerlink/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(ensure_ledgerlink_home()?.join("config.toml")),
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write a default config unless one exists. Returns whether a file was written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(path, &Config::default())?;
    Ok(true)
}
