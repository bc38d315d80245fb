// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod error;
mod redis_store;

pub use error::StoreError;
pub use redis_store::{CONNECT_TIMEOUT, RedisStore, redact_url, validate_redis_url};

use rediscope_app::{KeyPage, KeyType, Ttl, ValuePayload};

pub type StoreResult<T> = Result<T, StoreError>;

/// Blocking access to one logical database of a key-value server.
///
/// Every method may be called from a worker thread; implementations serialize
/// access to their connection internally.
pub trait KeyValueStore: Send + Sync {
    /// Display form of the server address and database, without credentials.
    fn endpoint(&self) -> String;
    fn database(&self) -> u16;
    fn ping(&self) -> StoreResult<()>;
    /// One incremental scan step. A returned cursor of `0` means the scan is
    /// complete.
    fn scan_keys(&self, pattern: &str, cursor: u64, count: usize) -> StoreResult<KeyPage>;
    /// Raw type name as reported by the server, `none` for a missing key.
    fn key_type(&self, key: &str) -> StoreResult<String>;
    fn get_string(&self, key: &str) -> StoreResult<String>;
    fn get_hash(&self, key: &str) -> StoreResult<Vec<(String, String)>>;
    fn get_list(&self, key: &str) -> StoreResult<Vec<String>>;
    fn get_set(&self, key: &str) -> StoreResult<Vec<String>>;
    fn get_sorted_set(&self, key: &str) -> StoreResult<Vec<(String, f64)>>;
    /// Raw `TTL` reply: `-2` missing, `-1` no expiry.
    fn ttl(&self, key: &str) -> StoreResult<i64>;
    fn set_value(&self, key: &str, value: &str) -> StoreResult<()>;
    fn delete_keys(&self, keys: &[String]) -> StoreResult<u64>;
    /// Opens a fresh handle bound to database `index`. The handle is not
    /// verified; callers ping it before use.
    fn with_database(&self, index: u16) -> StoreResult<Box<dyn KeyValueStore>>;
}

/// Fetches the value of `key` according to its type, then its TTL.
pub fn fetch_value(store: &dyn KeyValueStore, key: &str) -> StoreResult<(ValuePayload, Ttl)> {
    let type_name = store.key_type(key)?;
    if type_name == "none" {
        return Err(StoreError::MissingKey(key.to_owned()));
    }
    let Some(key_type) = KeyType::parse(&type_name) else {
        return Err(StoreError::UnsupportedType {
            key: key.to_owned(),
            type_name,
        });
    };

    let payload = match key_type {
        KeyType::String => ValuePayload::Text(strip_control_chars(&store.get_string(key)?)),
        KeyType::Hash => ValuePayload::Hash(store.get_hash(key)?),
        KeyType::List => ValuePayload::List(store.get_list(key)?),
        KeyType::Set => ValuePayload::Set(store.get_set(key)?),
        KeyType::SortedSet => ValuePayload::SortedSet(store.get_sorted_set(key)?),
    };
    let ttl = Ttl::from_reply(store.ttl(key)?);
    tracing::debug!(key, key_type = key_type.as_str(), ?ttl, "fetched value");
    Ok((payload, ttl))
}

/// Drops every code point below U+0020 so a value cannot corrupt the
/// terminal.
pub fn strip_control_chars(value: &str) -> String {
    value.chars().filter(|ch| u32::from(*ch) >= 32).collect()
}
