//! Configuration for reelay.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables / CLI flags (TELEGRAM_TOKEN, COBALT_API_URL)
//! 2. Config file (.reelay/config.yaml, or REELAY_CONFIG)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .reelay/config.yaml
//! - A relative scratch_dir is resolved against the config file's directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::telegram::TelegramConfig;
use crate::core::RelayLimits;

/// Name of the scratch directory under the system temp root
const SCRATCH_DIR_NAME: &str = "reelay";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub telegram: TelegramSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelaySection {
    pub max_bytes: Option<u64>,
    pub chunk_size: Option<usize>,
    pub resolve_timeout_seconds: Option<u64>,
    pub download_timeout_seconds: Option<u64>,
    /// Staging directory (relative to config file, `~` expanded)
    pub scratch_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramSection {
    pub poll_timeout_seconds: Option<u64>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub telegram_token: Option<String>,
    pub resolver_url: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Telegram bot token
    pub telegram_token: Option<String>,
    /// Cobalt API base address
    pub resolver_url: Option<String>,
    /// Relay limits
    pub limits: RelayLimits,
    /// Absolute path to the staging directory
    pub scratch_dir: PathBuf,
    /// getUpdates long-poll timeout
    pub poll_timeout_seconds: u64,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Load configuration from all sources
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let config_file = match overrides.config_file {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path)
            }
            None => std::env::current_dir()
                .ok()
                .and_then(|dir| find_config_file(&dir)),
        };

        let file = config_file
            .as_deref()
            .map(load_config_file)
            .transpose()?;

        let mut config = Self::from_parts(file.as_ref(), config_file.as_deref());
        config.telegram_token = overrides.telegram_token.filter(|t| !t.trim().is_empty());
        config.resolver_url = overrides.resolver_url.filter(|u| !u.trim().is_empty());
        config.config_file = config_file;
        Ok(config)
    }

    /// Merge a parsed config file over the defaults
    fn from_parts(file: Option<&ConfigFile>, config_path: Option<&Path>) -> Self {
        let defaults = RelayLimits::default();
        let relay = file.map(|f| f.relay.clone()).unwrap_or_default();

        let limits = RelayLimits {
            max_bytes: relay.max_bytes.unwrap_or(defaults.max_bytes),
            chunk_size: relay.chunk_size.unwrap_or(defaults.chunk_size),
            resolve_timeout_seconds: relay
                .resolve_timeout_seconds
                .unwrap_or(defaults.resolve_timeout_seconds),
            download_timeout_seconds: relay
                .download_timeout_seconds
                .unwrap_or(defaults.download_timeout_seconds),
        };

        let base = config_path
            .and_then(Path::parent)
            .unwrap_or(Path::new("."));
        let scratch_dir = relay
            .scratch_dir
            .as_deref()
            .map(|dir| resolve_path(base, dir))
            .unwrap_or_else(default_scratch_dir);

        let poll_timeout_seconds = file
            .and_then(|f| f.telegram.poll_timeout_seconds)
            .unwrap_or(30);

        Self {
            telegram_token: None,
            resolver_url: None,
            limits,
            scratch_dir,
            poll_timeout_seconds,
            config_file: None,
        }
    }

    /// The Telegram settings; fails if no token was provided
    pub fn telegram(&self) -> Result<TelegramConfig> {
        let bot_token = self
            .telegram_token
            .clone()
            .context("TELEGRAM_TOKEN is not set in the environment")?;

        Ok(TelegramConfig {
            bot_token,
            poll_timeout_seconds: self.poll_timeout_seconds,
        })
    }

    /// The cobalt API address; fails if none was provided
    pub fn resolver_url(&self) -> Result<&str> {
        self.resolver_url
            .as_deref()
            .context("COBALT_API_URL is not set in the environment")
    }
}

/// Default staging directory under the system temp root
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_DIR_NAME)
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".reelay").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file or start with `~`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
