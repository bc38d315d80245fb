// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DATABASE_COUNT: u16 = 16;
pub const DEFAULT_PAGE_SIZE: usize = 40;
pub const DEFAULT_NOTIFICATION_LIFETIME: Duration = Duration::from_secs(5);
pub const ERROR_NOTIFICATION_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Listing,
    Filtering,
    EditingValue,
    Help,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Listing => "list",
            Self::Filtering => "filter",
            Self::EditingValue => "edit",
            Self::Help => "help",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Keyboard input as seen by the session, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

/// One page of a cursor-based key listing. A cursor of zero means the key
/// space is exhausted after this page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPage {
    keys: Vec<String>,
    cursor: u64,
}

impl KeyPage {
    pub fn new(keys: Vec<String>, cursor: u64) -> Self {
        Self { keys, cursor }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    pub const fn has_more(&self) -> bool {
        self.cursor != 0
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Builds the page that supersedes this one once `removed` keys are gone.
    pub fn without(&self, removed: &[String]) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .filter(|key| !removed.contains(key))
                .cloned()
                .collect(),
            cursor: self.cursor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    String,
    Hash,
    List,
    Set,
    SortedSet,
}

impl KeyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Hash => "hash",
            Self::List => "list",
            Self::Set => "set",
            Self::SortedSet => "zset",
        }
    }

    /// Parses a `TYPE` reply. Returns `None` for types without a renderer
    /// (streams, modules) and for `none`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "hash" => Some(Self::Hash),
            "list" => Some(Self::List),
            "set" => Some(Self::Set),
            "zset" => Some(Self::SortedSet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValuePayload {
    Text(String),
    Hash(Vec<(String, String)>),
    List(Vec<String>),
    Set(Vec<String>),
    SortedSet(Vec<(String, f64)>),
}

impl ValuePayload {
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::Text(_) => KeyType::String,
            Self::Hash(_) => KeyType::Hash,
            Self::List(_) => KeyType::List,
            Self::Set(_) => KeyType::Set,
            Self::SortedSet(_) => KeyType::SortedSet,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// JSON form of the value: an object for hashes, arrays for lists and
    /// sets, ordered `{member, score}` pairs for sorted sets.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(text) => serde_json::Value::from(text.as_str()),
            Self::Hash(entries) => {
                let object = entries
                    .iter()
                    .map(|(field, value)| (field.clone(), serde_json::Value::from(value.as_str())))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            }
            Self::List(items) | Self::Set(items) => serde_json::Value::from(items.clone()),
            Self::SortedSet(members) => serde_json::Value::Array(
                members
                    .iter()
                    .map(|(member, score)| serde_json::json!({ "member": member, "score": score }))
                    .collect(),
            ),
        }
    }

    /// Single-line text form: the raw string for string values, compact JSON
    /// for structured ones.
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            _ => self.to_json().to_string(),
        }
    }
}

/// Remaining lifetime of a key at the moment it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    #[default]
    Persistent,
    Expires(u64),
}

impl Ttl {
    /// Maps a raw `TTL` reply. `-2` (missing), `-1` (no expiry) and `0` all
    /// collapse to `Persistent`.
    pub const fn from_reply(seconds: i64) -> Self {
        if seconds > 0 {
            Self::Expires(seconds as u64)
        } else {
            Self::Persistent
        }
    }

    pub const fn seconds(self) -> Option<u64> {
        match self {
            Self::Persistent => None,
            Self::Expires(seconds) => Some(seconds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Operation,
    UnsupportedType,
    MissingKey,
    Clipboard,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Operation => "operation",
            Self::UnsupportedType => "unsupported type",
            Self::MissingKey => "missing key",
            Self::Clipboard => "clipboard",
        }
    }
}

/// Identifies which asynchronous command a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListKeys { listing: crate::ListingId },
    FetchValue { key: String },
    SetValue { key: String },
    DeleteKey { key: String },
    BulkDelete { count: usize },
    SwitchDatabase { index: u16 },
    CopyToClipboard,
}

impl Operation {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ListKeys { .. } => "list keys",
            Self::FetchValue { .. } => "get value",
            Self::SetValue { .. } => "set value",
            Self::DeleteKey { .. } => "delete key",
            Self::BulkDelete { .. } => "bulk delete",
            Self::SwitchDatabase { .. } => "switch database",
            Self::CopyToClipboard => "copy",
        }
    }
}
