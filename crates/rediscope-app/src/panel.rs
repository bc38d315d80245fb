// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Ttl, ValuePayload};

/// Last fetched value for the highlighted key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValuePanel {
    key: String,
    payload: Option<ValuePayload>,
    ttl: Ttl,
}

impl ValuePanel {
    pub fn load(&mut self, key: impl Into<String>, payload: ValuePayload, ttl: Ttl) {
        self.key = key.into();
        self.payload = Some(payload);
        self.ttl = ttl;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> Option<&ValuePayload> {
        self.payload.as_ref()
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn is_loaded(&self) -> bool {
        self.payload.is_some()
    }
}
