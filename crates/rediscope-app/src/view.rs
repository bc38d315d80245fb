// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Mode, Notification, Session, TerminalSize, Ttl, ValuePayload};

/// Everything the renderer may read. Rendering is a pure function of this
/// projection and the terminal size.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView<'a> {
    pub mode: Mode,
    pub endpoint: &'a str,
    pub terminal: TerminalSize,
    pub keys: Vec<&'a str>,
    /// Position of the highlighted key within `keys`, if it is visible.
    pub highlight: Option<usize>,
    pub page_number: usize,
    pub page_count: usize,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub listing_pending: bool,
    pub value: Option<ValueView<'a>>,
    pub active_database: u16,
    pub database_count: u16,
    pub switching_to: Option<u16>,
    pub notification: Option<&'a Notification>,
    pub filter_text: &'a str,
    pub filter_focused: bool,
    pub filter_committed: bool,
    pub staged_edit: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueView<'a> {
    pub key: &'a str,
    pub payload: &'a ValuePayload,
    pub ttl: Ttl,
}

impl Session {
    pub fn view(&self) -> SessionView<'_> {
        let keys = self.visible_keys();
        let highlighted = self.history().highlighted_key();
        let highlight = highlighted.and_then(|target| keys.iter().position(|key| *key == target));
        let panel = self.panel();
        let value = panel.payload().map(|payload| ValueView {
            key: panel.key(),
            payload,
            ttl: panel.ttl(),
        });
        let tabs = self.databases();

        SessionView {
            mode: self.mode(),
            endpoint: self.endpoint(),
            terminal: self.terminal_size(),
            keys,
            highlight,
            page_number: self.history().history_index() + 1,
            page_count: self.history().len(),
            can_advance: self.history().can_advance(),
            can_retreat: self.history().can_retreat(),
            listing_pending: self.is_listing_pending(),
            value,
            active_database: tabs.active(),
            database_count: tabs.count(),
            switching_to: tabs.pending(),
            notification: self.notification(),
            filter_text: self.filter().query_text(),
            filter_focused: self.mode() == Mode::Filtering,
            filter_committed: self.filter().is_committed(),
            staged_edit: self.edit().map(|edit| edit.staged.as_str()),
        }
    }
}
