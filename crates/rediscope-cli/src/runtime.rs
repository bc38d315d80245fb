// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use rediscope_store::{KeyValueStore, RedisStore, redact_url};
use rediscope_tui::ClipboardSink;
use std::sync::Arc;

/// System clipboard. A fresh handle is opened per copy so a missing display
/// only fails the copy, not startup.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("open system clipboard")?;
        clipboard
            .set_text(text.to_owned())
            .context("write to system clipboard")?;
        tracing::debug!(chars = text.chars().count(), "copied value to clipboard");
        Ok(())
    }
}

/// Opens and verifies the initial connection. The database index taken from
/// the URL must be one of the `databases` tabs.
pub fn connect(url: &str, databases: u16) -> Result<Arc<dyn KeyValueStore>> {
    let store = RedisStore::connect(url)
        .with_context(|| format!("connect to redis at {}", redact_url(url)))?;
    ensure_database_in_range(store.database(), databases)?;
    tracing::info!(endpoint = %store.endpoint(), "connected to redis");
    Ok(Arc::new(store))
}

fn ensure_database_in_range(database: u16, databases: u16) -> Result<()> {
    if database >= databases {
        bail!(
            "database {database} from the connection url is outside the {databases} configured databases; raise [redis].databases or pick a lower index"
        );
    }
    Ok(())
}
