// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rediscope_app::{
    DEFAULT_DATABASE_COUNT, DEFAULT_PAGE_SIZE, ERROR_NOTIFICATION_LIFETIME, SessionSettings,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "rediscope";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

const CONFIG_VERSION: i64 = 1;
const MAX_DATABASES: i64 = 256;
const MAX_PAGE_SIZE: i64 = 10_000;
const DEFAULT_NOTIFICATION_TIMEOUT: &str = "5s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub redis: Redis,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            redis: Redis::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Redis {
    pub url: Option<String>,
    pub databases: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub notification_timeout: Option<String>,
    pub refresh_interval: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            notification_timeout: Some(DEFAULT_NOTIFICATION_TIMEOUT.to_owned()),
            refresh_interval: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub path: Option<String>,
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("REDISCOPE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set REDISCOPE_CONFIG_PATH to the config file"
            )
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and place values under [redis], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(url) = &self.redis.url {
            rediscope_store::validate_redis_url(url)
                .with_context(|| format!("redis.url in {}", path.display()))?;
        }

        if let Some(databases) = self.redis.databases
            && !(1..=MAX_DATABASES).contains(&databases)
        {
            bail!(
                "redis.databases in {} must be between 1 and {MAX_DATABASES}, got {databases}",
                path.display()
            );
        }

        if let Some(page_size) = self.redis.page_size
            && !(1..=MAX_PAGE_SIZE).contains(&page_size)
        {
            bail!(
                "redis.page_size in {} must be between 1 and {MAX_PAGE_SIZE}, got {page_size}",
                path.display()
            );
        }

        if let Some(timeout) = &self.ui.notification_timeout
            && parse_duration(timeout)? <= Duration::ZERO
        {
            bail!(
                "ui.notification_timeout in {} must be positive, got {timeout}",
                path.display()
            );
        }

        if let Some(interval) = &self.ui.refresh_interval
            && parse_duration(interval)? <= Duration::ZERO
        {
            bail!(
                "ui.refresh_interval in {} must be positive, got {interval}",
                path.display()
            );
        }

        Ok(())
    }

    /// `REDIS_URL` wins over `[redis].url`, which wins over the local default.
    pub fn redis_url(&self) -> String {
        if let Ok(url) = env::var("REDIS_URL")
            && !url.trim().is_empty()
        {
            return url.trim().to_owned();
        }
        self.redis
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_owned())
    }

    pub fn database_count(&self) -> u16 {
        self.redis
            .databases
            .and_then(|count| u16::try_from(count).ok())
            .unwrap_or(DEFAULT_DATABASE_COUNT)
    }

    pub fn page_size(&self) -> usize {
        self.redis
            .page_size
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn notification_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .notification_timeout
                .as_deref()
                .unwrap_or(DEFAULT_NOTIFICATION_TIMEOUT),
        )
    }

    pub fn refresh_interval(&self) -> Result<Option<Duration>> {
        self.ui
            .refresh_interval
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn session_settings(&self) -> Result<SessionSettings> {
        Ok(SessionSettings {
            database_count: self.database_count(),
            page_size: self.page_size(),
            notification_lifetime: self.notification_timeout()?,
            error_lifetime: ERROR_NOTIFICATION_LIFETIME,
        })
    }

    /// `REDISCOPE_LOG_PATH`, then `[log].path`, then the temp directory.
    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = env::var_os("REDISCOPE_LOG_PATH") {
            return PathBuf::from(path);
        }
        match &self.log.path {
            Some(path) => PathBuf::from(path),
            None => env::temp_dir().join(format!("{APP_NAME}.log")),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# rediscope config\n# Place this file at: {}\n\nversion = 1\n\n[redis]\n# REDIS_URL overrides this value when set.\nurl = \"{}\"\n# Number of logical databases offered as tabs.\ndatabases = {}\npage_size = {}\n\n[ui]\nnotification_timeout = \"{}\"\n# Optional. Re-fetch the highlighted value periodically.\n# refresh_interval = \"10s\"\n\n[log]\n# Optional. Default is <temp dir>/rediscope.log\n# path = \"/tmp/rediscope.log\"\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_REDIS_URL,
            DEFAULT_DATABASE_COUNT,
            DEFAULT_PAGE_SIZE,
            DEFAULT_NOTIFICATION_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
