//! Application configuration.
//!
//! Stored as JSON in `~/Library/Application Support/TransferDashboard/config.json`
//! (macOS) or `~/.config/TransferDashboard/config.json` (other Unix).
//! Every field has a default, so a partial or missing file still loads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const APP_NAME: &str = "TransferDashboard";
const CONFIG_FILENAME: &str = "config.json";
const MAX_NOTICE_TTL_SECS: u64 = 3600;

/// Overrides `api_base_url` for one run when set; never written back.
pub const API_ENV_VAR: &str = "TRANSFER_DASHBOARD_API";

/// One entry of the "Start Daily Batch" sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTransfer {
    pub from_account: String,
    pub to_account:   String,
    pub amount:       f64,
}

/// All persisted settings for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the money transfer API (the `/api/...` routes hang off it).
    pub api_base_url: String,
    /// Poll cadence of the refresh cycle.
    pub refresh_interval_ms: u64,
    /// Whether the poll timer is armed at start-up.
    pub auto_refresh: bool,
    /// Transactions shown per expanded account before "Showing N of M".
    pub history_preview_limit: usize,
    /// Lifetime of a user-facing notice.
    pub notice_ttl_secs: u64,
    pub batch_transfers: Vec<BatchTransfer>,
    /// Base URL taken from the environment for this run only.
    #[serde(skip)]
    pub(crate) api_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url:          "http://localhost:5001".into(),
            refresh_interval_ms:   200,
            auto_refresh:          true,
            history_preview_limit: 5,
            notice_ttl_secs:       5,
            batch_transfers:       default_batch(),
            api_override:          None,
        }
    }
}

impl Config {
    /// Load from disk, falling back to defaults, then apply the env override.
    pub fn load() -> Self {
        let path = Self::config_file_path();

        let mut cfg = match Self::load_from(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "config load failed, using defaults");
                Self::default()
            }
        };

        cfg.set_api_override(std::env::var(API_ENV_VAR).ok());
        cfg
    }

    /// Point this run at another API root without touching the saved URL.
    pub fn set_api_override(&mut self, url: Option<String>) {
        self.api_override = url
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty());
        if let Some(url) = &self.api_override {
            info!(api_base_url = %url, "api base url overridden from environment");
        }
    }

    /// The API root in effect: the override if set, else the saved URL.
    pub fn api_base_url(&self) -> &str {
        self.api_override.as_deref().unwrap_or(&self.api_base_url)
    }

    /// Persist the current config to the platform config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialise config")?;
        std::fs::write(path, json).with_context(|| format!("write config {:?}", path))?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {:?}", path))?;
        serde_json::from_str(&text).context("parse config JSON")
    }

    /// Path to the JSON config file on this platform.
    pub fn config_file_path() -> PathBuf {
        if let Some(proj) = ProjectDirs::from("", "", APP_NAME) {
            proj.config_dir().join(CONFIG_FILENAME)
        } else {
            dirs_fallback().join(CONFIG_FILENAME)
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        // A zero cadence would spin the timer.
        Duration::from_millis(self.refresh_interval_ms.max(50))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs.clamp(1, MAX_NOTICE_TTL_SECS))
    }
}

fn default_batch() -> Vec<BatchTransfer> {
    ["A", "B", "C", "D", "E"]
        .iter()
        .zip(["F", "G", "H", "I", "J"])
        .map(|(from, to)| BatchTransfer {
            from_account: format!("account_{from}"),
            to_account:   format!("account_{to}"),
            amount:       100.0,
        })
        .collect()
}

fn dirs_fallback() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".config").join(APP_NAME)
}
