// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use rediscope_app::KeyPage;
use rediscope_store::{KeyValueStore, StoreError, StoreResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Stored value of a [`MemoryStore`] key. `Other` stands in for types the
/// client does not render, such as streams.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryValue {
    Text(String),
    Hash(Vec<(String, String)>),
    List(Vec<String>),
    Set(Vec<String>),
    SortedSet(Vec<(String, f64)>),
    Other(String),
}

impl MemoryValue {
    fn type_name(&self) -> &str {
        match self {
            Self::Text(_) => "string",
            Self::Hash(_) => "hash",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::SortedSet(_) => "zset",
            Self::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: MemoryValue,
    ttl: i64,
}

#[derive(Debug, Default)]
struct Server {
    databases: BTreeMap<u16, BTreeMap<String, Entry>>,
    unreachable: BTreeSet<u16>,
    failures: BTreeMap<&'static str, String>,
    calls: Vec<String>,
}

/// In-process stand-in for a redis server. Clones and handles produced by
/// [`KeyValueStore::with_database`] share the same keyspace.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    server: Arc<Mutex<Server>>,
    database: u16,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            server: Arc::new(Mutex::new(Server::default())),
            database: 0,
        }
    }

    pub fn in_database(&self, database: u16) -> Self {
        Self {
            server: Arc::clone(&self.server),
            database,
        }
    }

    pub fn insert(&self, key: &str, value: MemoryValue) -> Result<()> {
        self.insert_with_ttl(key, value, -1)
    }

    pub fn insert_with_ttl(&self, key: &str, value: MemoryValue, ttl: i64) -> Result<()> {
        let mut server = self.lock_for_setup()?;
        server
            .databases
            .entry(self.database)
            .or_default()
            .insert(key.to_owned(), Entry { value, ttl });
        Ok(())
    }

    pub fn insert_text(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, MemoryValue::Text(value.to_owned()))
    }

    /// Inserts `prefix0..prefixN` string keys.
    pub fn seed_keys(&self, prefix: &str, count: usize) -> Result<()> {
        for index in 0..count {
            self.insert_text(&format!("{prefix}{index}"), &format!("value-{index}"))?;
        }
        Ok(())
    }

    pub fn value(&self, key: &str) -> Result<Option<MemoryValue>> {
        let server = self.lock_for_setup()?;
        Ok(server
            .databases
            .get(&self.database)
            .and_then(|keys| keys.get(key))
            .map(|entry| entry.value.clone()))
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let server = self.lock_for_setup()?;
        Ok(server
            .databases
            .get(&self.database)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Makes pings against `database` fail as if the server refused them.
    pub fn mark_unreachable(&self, database: u16) -> Result<()> {
        self.lock_for_setup()?.unreachable.insert(database);
        Ok(())
    }

    /// Makes every call of `operation` fail with `message` until cleared.
    /// Operation names are the trait method names, e.g. `delete_keys`.
    pub fn fail_operation(&self, operation: &'static str, message: &str) -> Result<()> {
        self.lock_for_setup()?
            .failures
            .insert(operation, message.to_owned());
        Ok(())
    }

    pub fn clear_failures(&self) -> Result<()> {
        self.lock_for_setup()?.failures.clear();
        Ok(())
    }

    /// Operations performed so far, formatted as `db<N>:<operation>`.
    pub fn calls(&self) -> Result<Vec<String>> {
        Ok(self.lock_for_setup()?.calls.clone())
    }

    fn lock_for_setup(&self) -> Result<MutexGuard<'_, Server>> {
        self.server
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn begin(&self, operation: &'static str) -> StoreResult<MutexGuard<'_, Server>> {
        let mut server = self.server.lock().map_err(|_| StoreError::Poisoned)?;
        server.calls.push(format!("db{}:{operation}", self.database));
        if let Some(message) = server.failures.get(operation) {
            return Err(StoreError::Command(message.clone()));
        }
        Ok(server)
    }

    fn with_entry<T>(
        &self,
        operation: &'static str,
        key: &str,
        read: impl FnOnce(Option<&Entry>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let server = self.begin(operation)?;
        let entry = server
            .databases
            .get(&self.database)
            .and_then(|keys| keys.get(key));
        read(entry)
    }
}

fn wrong_type() -> StoreError {
    StoreError::Command(
        "WRONGTYPE Operation against a key holding the wrong kind of value".to_owned(),
    )
}

impl KeyValueStore for MemoryStore {
    fn endpoint(&self) -> String {
        format!("memory/{}", self.database)
    }

    fn database(&self) -> u16 {
        self.database
    }

    fn ping(&self) -> StoreResult<()> {
        let server = self.begin("ping")?;
        if server.unreachable.contains(&self.database) {
            return Err(StoreError::Connection(format!(
                "database {} refused the connection",
                self.database
            )));
        }
        Ok(())
    }

    fn scan_keys(&self, pattern: &str, cursor: u64, count: usize) -> StoreResult<KeyPage> {
        let server = self.begin("scan_keys")?;
        let matching = server
            .databases
            .get(&self.database)
            .map(|keys| {
                keys.keys()
                    .filter(|key| glob_match(pattern, key))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(matching.len());
        let end = start.saturating_add(count.max(1)).min(matching.len());
        let next = if end >= matching.len() { 0 } else { end as u64 };
        Ok(KeyPage::new(matching[start..end].to_vec(), next))
    }

    fn key_type(&self, key: &str) -> StoreResult<String> {
        self.with_entry("key_type", key, |entry| {
            Ok(entry.map_or("none", |entry| entry.value.type_name()).to_owned())
        })
    }

    fn get_string(&self, key: &str) -> StoreResult<String> {
        self.with_entry("get_string", key, |entry| match entry.map(|e| &e.value) {
            Some(MemoryValue::Text(text)) => Ok(text.clone()),
            Some(_) => Err(wrong_type()),
            None => Err(StoreError::MissingKey(key.to_owned())),
        })
    }

    fn get_hash(&self, key: &str) -> StoreResult<Vec<(String, String)>> {
        self.with_entry("get_hash", key, |entry| match entry.map(|e| &e.value) {
            Some(MemoryValue::Hash(fields)) => Ok(fields.clone()),
            Some(_) => Err(wrong_type()),
            None => Ok(Vec::new()),
        })
    }

    fn get_list(&self, key: &str) -> StoreResult<Vec<String>> {
        self.with_entry("get_list", key, |entry| match entry.map(|e| &e.value) {
            Some(MemoryValue::List(items)) => Ok(items.clone()),
            Some(_) => Err(wrong_type()),
            None => Ok(Vec::new()),
        })
    }

    fn get_set(&self, key: &str) -> StoreResult<Vec<String>> {
        self.with_entry("get_set", key, |entry| match entry.map(|e| &e.value) {
            Some(MemoryValue::Set(items)) => Ok(items.clone()),
            Some(_) => Err(wrong_type()),
            None => Ok(Vec::new()),
        })
    }

    fn get_sorted_set(&self, key: &str) -> StoreResult<Vec<(String, f64)>> {
        self.with_entry("get_sorted_set", key, |entry| match entry.map(|e| &e.value) {
            Some(MemoryValue::SortedSet(members)) => Ok(members.clone()),
            Some(_) => Err(wrong_type()),
            None => Ok(Vec::new()),
        })
    }

    fn ttl(&self, key: &str) -> StoreResult<i64> {
        self.with_entry("ttl", key, |entry| Ok(entry.map_or(-2, |entry| entry.ttl)))
    }

    fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut server = self.begin("set_value")?;
        server.databases.entry(self.database).or_default().insert(
            key.to_owned(),
            Entry {
                value: MemoryValue::Text(value.to_owned()),
                ttl: -1,
            },
        );
        Ok(())
    }

    fn delete_keys(&self, keys: &[String]) -> StoreResult<u64> {
        let mut server = self.begin("delete_keys")?;
        let Some(stored) = server.databases.get_mut(&self.database) else {
            return Ok(0);
        };
        let removed = keys
            .iter()
            .filter(|key| stored.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }

    fn with_database(&self, index: u16) -> StoreResult<Box<dyn KeyValueStore>> {
        drop(self.begin("with_database")?);
        Ok(Box::new(self.in_database(index)))
    }
}

/// Redis `MATCH` semantics: `*`, `?`, `[...]` classes with ranges and `^`
/// negation, and backslash escapes.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.chars().collect::<Vec<_>>();
    let text = text.chars().collect::<Vec<_>>();
    match_from(&pattern, &text)
}

fn match_from(pattern: &[char], text: &[char]) -> bool {
    let Some((&first, rest)) = pattern.split_first() else {
        return text.is_empty();
    };
    match first {
        '*' => (0..=text.len()).any(|skip| match_from(rest, &text[skip..])),
        '?' => !text.is_empty() && match_from(rest, &text[1..]),
        '[' => {
            let Some((&candidate, remaining)) = text.split_first() else {
                return false;
            };
            match match_class(rest, candidate) {
                Some((true, after)) => match_from(after, remaining),
                Some((false, _)) => false,
                None => candidate == '[' && match_from(rest, remaining),
            }
        }
        '\\' if !rest.is_empty() => {
            text.first() == Some(&rest[0]) && match_from(&rest[1..], &text[1..])
        }
        literal => text.first() == Some(&literal) && match_from(rest, &text[1..]),
    }
}

/// Returns whether `candidate` is in the class and the pattern after `]`.
/// `None` means the class is unterminated.
fn match_class(class: &[char], candidate: char) -> Option<(bool, &[char])> {
    let (negated, mut index) = match class.first() {
        Some('^') => (true, 1),
        _ => (false, 0),
    };
    let mut matched = false;
    while index < class.len() {
        match class[index] {
            ']' => return Some((matched != negated, &class[index + 1..])),
            '\\' if index + 1 < class.len() => {
                matched |= class[index + 1] == candidate;
                index += 2;
            }
            low if index + 2 < class.len()
                && class[index + 1] == '-'
                && class[index + 2] != ']' =>
            {
                let high = class[index + 2];
                let (low, high) = if low <= high { (low, high) } else { (high, low) };
                matched |= (low..=high).contains(&candidate);
                index += 3;
            }
            single => {
                matched |= single == candidate;
                index += 1;
            }
        }
    }
    None
}
