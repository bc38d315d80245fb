// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use rediscope_app::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid redis url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Command(String),

    #[error("key {0:?} does not exist")]
    MissingKey(String),

    #[error("key {key:?} has unsupported type {type_name}")]
    UnsupportedType { key: String, type_name: String },

    #[error("connection lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } | Self::Connection(_) | Self::Poisoned => {
                ErrorKind::Connection
            }
            Self::Command(_) => ErrorKind::Operation,
            Self::MissingKey(_) => ErrorKind::MissingKey,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_io_error()
            || error.is_connection_refusal()
            || error.is_connection_dropped()
            || error.is_timeout()
        {
            Self::Connection(error.to_string())
        } else {
            Self::Command(error.to_string())
        }
    }
}
