// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Truncates the session log at `path` and routes every `tracing` event to
/// it. The terminal belongs to the UI, so nothing is written to stderr.
pub fn init(path: &Path, level: &str) -> Result<()> {
    let filter = filter_for(level, env::var("RUST_LOG").ok())?;
    let file = File::create(path).with_context(|| format!("create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(())
}

/// `RUST_LOG` wins when set and non-empty; otherwise the configured level.
fn filter_for(level: &str, rust_log: Option<String>) -> Result<EnvFilter> {
    let directives = rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| level.to_owned());
    EnvFilter::try_new(&directives).with_context(|| {
        format!("invalid log filter {directives:?}; use a level such as info or debug")
    })
}
