// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::HandleId;

/// Active logical database and the handle bound to it. A switch only takes
/// effect once the new handle has been verified and reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseSelector {
    active: u16,
    count: u16,
    handle: HandleId,
    pending: Option<u16>,
}

impl DatabaseSelector {
    pub fn new(active: u16, count: u16, handle: HandleId) -> Self {
        let count = count.max(1);
        Self {
            active: active % count,
            count,
            handle,
            pending: None,
        }
    }

    /// Computes the target index for a switch by `delta` tabs, counting from a
    /// switch still in flight. Returns `None` when the target is already active.
    pub fn switch(&mut self, delta: i32) -> Option<u16> {
        let base = i32::from(self.pending.unwrap_or(self.active));
        let target = (base + delta).rem_euclid(i32::from(self.count)) as u16;
        if self.pending.is_none() && target == self.active {
            return None;
        }
        self.pending = Some(target);
        Some(target)
    }

    /// Applies a verified switch. Completions for anything other than the
    /// latest requested index are ignored.
    pub fn complete(&mut self, index: u16, handle: HandleId) -> bool {
        if self.pending != Some(index) {
            return false;
        }
        self.pending = None;
        self.active = index;
        self.handle = handle;
        true
    }

    pub fn fail(&mut self, index: u16) -> bool {
        if self.pending != Some(index) {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn active(&self) -> u16 {
        self.active
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn pending(&self) -> Option<u16> {
        self.pending
    }
}
