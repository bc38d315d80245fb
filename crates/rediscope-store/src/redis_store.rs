// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{KeyValueStore, StoreError, StoreResult};
use rediscope_app::KeyPage;
use redis::{Client, Cmd, ConnectionInfo, FromRedisValue};
use std::sync::Mutex;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const URL_SCHEMES: [&str; 4] = ["redis://", "rediss://", "redis+unix://", "unix://"];

/// A single blocking connection to one logical database.
pub struct RedisStore {
    client: Client,
    connection: Mutex<redis::Connection>,
    database: u16,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

/// Rejects anything that is not a redis connection URL before the client
/// parser sees it, so mistakes surface with the offending text.
pub fn validate_redis_url(url: &str) -> StoreResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(StoreError::InvalidUrl {
            url: String::new(),
            reason: "url is empty".to_owned(),
        });
    }
    if !URL_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        return Err(StoreError::InvalidUrl {
            url: redact_url(url),
            reason: format!("scheme must be one of {}", URL_SCHEMES.join(", ")),
        });
    }
    Ok(())
}

impl RedisStore {
    /// Opens a connection for `url` and verifies it with a ping.
    pub fn connect(url: &str) -> StoreResult<Self> {
        validate_redis_url(url)?;
        let client = Client::open(url).map_err(|error| StoreError::InvalidUrl {
            url: redact_url(url),
            reason: error.to_string(),
        })?;
        let store = Self::open(client)?;
        store.ping()?;
        Ok(store)
    }

    fn open(client: Client) -> StoreResult<Self> {
        let db = client.get_connection_info().redis.db;
        let database = u16::try_from(db).map_err(|_| StoreError::InvalidUrl {
            url: client.get_connection_info().addr.to_string(),
            reason: format!("database index {db} is out of range"),
        })?;
        let connection = client.get_connection_with_timeout(CONNECT_TIMEOUT)?;
        tracing::debug!(addr = %client.get_connection_info().addr, database, "opened connection");
        Ok(Self {
            client,
            connection: Mutex::new(connection),
            database,
        })
    }

    fn query<T: FromRedisValue>(&self, command: &Cmd) -> StoreResult<T> {
        let mut connection = self.connection.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(command.query(&mut *connection)?)
    }
}

impl KeyValueStore for RedisStore {
    fn endpoint(&self) -> String {
        format!("{}/{}", self.client.get_connection_info().addr, self.database)
    }

    fn database(&self) -> u16 {
        self.database
    }

    fn ping(&self) -> StoreResult<()> {
        let _: String = self.query(&redis::cmd("PING"))?;
        Ok(())
    }

    fn scan_keys(&self, pattern: &str, cursor: u64, count: usize) -> StoreResult<KeyPage> {
        let mut command = redis::cmd("SCAN");
        command.arg(cursor).arg("MATCH").arg(pattern).arg("COUNT").arg(count);
        let (next, keys): (u64, Vec<String>) = self.query(&command)?;
        tracing::debug!(pattern, cursor, next, found = keys.len(), "scanned keys");
        Ok(KeyPage::new(keys, next))
    }

    fn key_type(&self, key: &str) -> StoreResult<String> {
        self.query(redis::cmd("TYPE").arg(key))
    }

    fn get_string(&self, key: &str) -> StoreResult<String> {
        let value: Option<String> = self.query(redis::cmd("GET").arg(key))?;
        value.ok_or_else(|| StoreError::MissingKey(key.to_owned()))
    }

    fn get_hash(&self, key: &str) -> StoreResult<Vec<(String, String)>> {
        let flat: Vec<String> = self.query(redis::cmd("HGETALL").arg(key))?;
        Ok(pairs(flat))
    }

    fn get_list(&self, key: &str) -> StoreResult<Vec<String>> {
        self.query(redis::cmd("LRANGE").arg(key).arg(0).arg(-1))
    }

    fn get_set(&self, key: &str) -> StoreResult<Vec<String>> {
        self.query(redis::cmd("SMEMBERS").arg(key))
    }

    fn get_sorted_set(&self, key: &str) -> StoreResult<Vec<(String, f64)>> {
        let flat: Vec<String> =
            self.query(redis::cmd("ZRANGE").arg(key).arg(0).arg(-1).arg("WITHSCORES"))?;
        pairs(flat)
            .into_iter()
            .map(|(member, score)| {
                let score = score.parse::<f64>().map_err(|_| {
                    StoreError::Command(format!("invalid score {score:?} for member {member:?}"))
                })?;
                Ok((member, score))
            })
            .collect()
    }

    fn ttl(&self, key: &str) -> StoreResult<i64> {
        self.query(redis::cmd("TTL").arg(key))
    }

    fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let _: String = self.query(redis::cmd("SET").arg(key).arg(value))?;
        tracing::info!(key, "set value");
        Ok(())
    }

    fn delete_keys(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let removed: u64 = self.query(redis::cmd("DEL").arg(keys))?;
        tracing::info!(requested = keys.len(), removed, "deleted keys");
        Ok(removed)
    }

    fn with_database(&self, index: u16) -> StoreResult<Box<dyn KeyValueStore>> {
        let mut info: ConnectionInfo = self.client.get_connection_info().clone();
        info.redis.db = i64::from(index);
        let client = Client::open(info)?;
        Ok(Box::new(Self::open(client)?))
    }
}

fn pairs(flat: Vec<String>) -> Vec<(String, String)> {
    let mut items = flat.into_iter();
    let mut out = Vec::new();
    while let (Some(first), Some(second)) = (items.next(), items.next()) {
        out.push((first, second));
    }
    out
}

/// Hides the password component of a URL.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}{tail}")
        }
        None => url.to_owned(),
    }
}
