// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    Advance, DEFAULT_DATABASE_COUNT, DEFAULT_NOTIFICATION_LIFETIME, DEFAULT_PAGE_SIZE,
    DatabaseSelector, ERROR_NOTIFICATION_LIFETIME, ErrorKind, FilterState, HandleId, Key,
    KeyPage, KeyPageHistory, ListingId, MATCH_ALL, Mode, Notification, NotificationId,
    NotificationKind, NotificationRegistry, Operation, TerminalSize, Ttl, ValuePanel,
    ValuePayload,
};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub database_count: u16,
    pub page_size: usize,
    pub notification_lifetime: Duration,
    pub error_lifetime: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            database_count: DEFAULT_DATABASE_COUNT,
            page_size: DEFAULT_PAGE_SIZE,
            notification_lifetime: DEFAULT_NOTIFICATION_LIFETIME,
            error_lifetime: ERROR_NOTIFICATION_LIFETIME,
        }
    }
}

/// Everything the session reacts to: input, timers and command results.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started {
        endpoint: String,
    },
    KeyPressed(Key),
    Resized {
        rows: u16,
        cols: u16,
    },
    Tick,
    KeysListed {
        listing: ListingId,
        page: KeyPage,
    },
    ValueFetched {
        handle: HandleId,
        key: String,
        payload: ValuePayload,
        ttl: Ttl,
    },
    ValueSet {
        handle: HandleId,
        key: String,
        value: String,
    },
    KeyDeleted {
        handle: HandleId,
        key: String,
    },
    KeysDeleted {
        handle: HandleId,
        keys: Vec<String>,
    },
    DatabaseSwitched {
        index: u16,
        handle: HandleId,
    },
    Copied,
    NotificationExpired(NotificationId),
    OperationFailed {
        operation: Operation,
        kind: ErrorKind,
        message: String,
    },
}

/// Effects requested by the session. Store commands carry the handle that was
/// active when they were issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListKeys {
        listing: ListingId,
        handle: HandleId,
        pattern: String,
        cursor: u64,
        count: usize,
    },
    FetchValue {
        handle: HandleId,
        key: String,
    },
    SetValue {
        handle: HandleId,
        key: String,
        value: String,
    },
    DeleteKey {
        handle: HandleId,
        key: String,
    },
    BulkDelete {
        handle: HandleId,
        keys: Vec<String>,
    },
    SwitchDatabase {
        handle: HandleId,
        index: u16,
    },
    CopyToClipboard {
        text: String,
    },
    ExpireNotification {
        id: NotificationId,
        after: Duration,
    },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Reset,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingListing {
    listing: ListingId,
    placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub key: String,
    pub staged: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    mode: Mode,
    terminal_size: TerminalSize,
    settings: SessionSettings,
    endpoint: String,
    tabs: DatabaseSelector,
    notifications: NotificationRegistry,
    history: KeyPageHistory,
    filter: FilterState,
    panel: ValuePanel,
    edit: Option<EditBuffer>,
    pending_listing: Option<PendingListing>,
    next_listing: ListingId,
}

impl Session {
    pub fn new(settings: SessionSettings, active_database: u16, handle: HandleId) -> Self {
        Self {
            mode: Mode::Listing,
            terminal_size: TerminalSize::default(),
            settings,
            endpoint: String::new(),
            tabs: DatabaseSelector::new(active_database, settings.database_count, handle),
            notifications: NotificationRegistry::default(),
            history: KeyPageHistory::default(),
            filter: FilterState::default(),
            panel: ValuePanel::default(),
            edit: None,
            pending_listing: None,
            next_listing: ListingId::new(1),
        }
    }

    /// Folds one event into the session and returns the commands to run.
    pub fn reduce(mut self, event: Event) -> (Self, Vec<Command>) {
        let mut commands = Vec::new();
        self.apply(event, &mut commands);
        (self, commands)
    }

    fn apply(&mut self, event: Event, out: &mut Vec<Command>) {
        match event {
            Event::Started { endpoint } => {
                let text = format!("connected to {endpoint}");
                self.endpoint = endpoint;
                self.notify(NotificationKind::Info, text, out);
                self.request_listing(Placement::Reset, MATCH_ALL.to_owned(), 0, out);
            }
            Event::KeyPressed(key) => self.handle_key(key, out),
            Event::Resized { rows, cols } => {
                self.terminal_size = TerminalSize { rows, cols };
            }
            Event::Tick => {
                if self.mode != Mode::Listing {
                    return;
                }
                if let Some(key) = self.history.highlighted_key() {
                    out.push(Command::FetchValue {
                        handle: self.tabs.handle(),
                        key: key.to_owned(),
                    });
                }
            }
            Event::KeysListed { listing, page } => self.apply_listing(listing, page, out),
            Event::ValueFetched {
                handle,
                key,
                payload,
                ttl,
            } => {
                if self.is_current(handle, &key) {
                    self.panel.load(key, payload, ttl);
                }
            }
            Event::ValueSet { handle, key, value } => {
                if self.is_current(handle, &key) {
                    self.panel
                        .load(key.clone(), ValuePayload::Text(value), Ttl::Persistent);
                }
                self.notify(NotificationKind::Info, format!("updated {key:?}"), out);
            }
            Event::KeyDeleted { handle, key } => {
                // A delete finishing on a database we already left must not
                // touch the listing of the one now shown.
                if handle == self.tabs.handle() {
                    self.remove_keys(std::slice::from_ref(&key), out);
                }
                self.notify(NotificationKind::Info, format!("deleted {key:?}"), out);
            }
            Event::KeysDeleted { handle, keys } => {
                let current = handle == self.tabs.handle();
                if current {
                    self.remove_keys(&keys, out);
                }
                self.notify(
                    NotificationKind::Info,
                    format!("deleted {} keys", keys.len()),
                    out,
                );
                if current {
                    let pattern = self.filter.pattern();
                    self.request_listing(Placement::Reset, pattern, 0, out);
                }
            }
            Event::DatabaseSwitched { index, handle } => {
                if !self.tabs.complete(index, handle) {
                    return;
                }
                self.history = KeyPageHistory::default();
                self.filter.clear();
                self.panel.clear();
                self.edit = None;
                if matches!(self.mode, Mode::Filtering | Mode::EditingValue) {
                    self.mode = Mode::Listing;
                }
                self.pending_listing = None;
                self.notify(NotificationKind::Info, format!("switched to db{index}"), out);
                self.request_listing(Placement::Reset, MATCH_ALL.to_owned(), 0, out);
            }
            Event::Copied => {
                self.notify(NotificationKind::Info, "copied value to clipboard", out);
            }
            Event::NotificationExpired(id) => {
                self.notifications.expire(id);
            }
            Event::OperationFailed {
                operation,
                kind,
                message,
            } => {
                match &operation {
                    Operation::SwitchDatabase { index } => {
                        self.tabs.fail(*index);
                    }
                    Operation::ListKeys { listing } => {
                        if self
                            .pending_listing
                            .is_some_and(|pending| pending.listing == *listing)
                        {
                            self.pending_listing = None;
                        }
                    }
                    _ => {}
                }
                let text = match kind {
                    ErrorKind::Operation => format!("{} failed: {message}", operation.label()),
                    _ => format!("{} failed ({}): {message}", operation.label(), kind.as_str()),
                };
                self.notify(NotificationKind::Error, text, out);
            }
        }
    }

    fn handle_key(&mut self, key: Key, out: &mut Vec<Command>) {
        match self.mode {
            Mode::Listing => self.handle_listing_key(key, out),
            Mode::Filtering => self.handle_filter_key(key, out),
            Mode::EditingValue => self.handle_edit_key(key, out),
            Mode::Help => self.mode = Mode::Listing,
        }
    }

    fn handle_listing_key(&mut self, key: Key, out: &mut Vec<Command>) {
        match key {
            Key::Char('q') | Key::Esc | Key::Ctrl('c') => out.push(Command::Quit),
            Key::Up | Key::Char('k') => self.move_highlight(-1, out),
            Key::Down | Key::Char('j') => self.move_highlight(1, out),
            Key::Home | Key::Char('g') => self.jump_highlight(0, out),
            Key::End | Key::Char('G') => self.jump_highlight(usize::MAX, out),
            Key::Char('/') => {
                self.filter.begin();
                self.mode = Mode::Filtering;
            }
            Key::Enter => self.begin_edit(out),
            Key::Tab => self.switch_database(1, out),
            Key::BackTab => self.switch_database(-1, out),
            Key::Char('n' | 'l') | Key::Right => self.next_page(out),
            Key::Char('p' | 'h') | Key::Left => self.previous_page(out),
            Key::Char('x') => self.delete_highlighted(out),
            Key::Char('X') => self.delete_visible(out),
            Key::Char('y') => self.copy_value(out),
            Key::Char('r') => {
                let pattern = self.filter.pattern();
                self.request_listing(Placement::Reset, pattern, 0, out);
            }
            Key::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: Key, out: &mut Vec<Command>) {
        match key {
            Key::Char(value) => self.filter.type_char(value),
            Key::Backspace => self.filter.backspace(),
            Key::Enter => {
                let pattern = self.filter.commit();
                self.mode = Mode::Listing;
                self.request_listing(Placement::Reset, pattern, 0, out);
            }
            Key::Esc | Key::Ctrl('c') => {
                self.filter.cancel();
                self.mode = Mode::Listing;
            }
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: Key, out: &mut Vec<Command>) {
        match key {
            Key::Char(value) => {
                if let Some(edit) = self.edit.as_mut() {
                    edit.staged.push(value);
                }
            }
            Key::Backspace => {
                if let Some(edit) = self.edit.as_mut() {
                    edit.staged.pop();
                }
            }
            Key::Enter => {
                self.mode = Mode::Listing;
                if let Some(edit) = self.edit.take() {
                    out.push(Command::SetValue {
                        handle: self.tabs.handle(),
                        key: edit.key,
                        value: edit.staged,
                    });
                }
            }
            Key::Esc | Key::Ctrl('c') => {
                self.edit = None;
                self.mode = Mode::Listing;
            }
            _ => {}
        }
    }

    fn move_highlight(&mut self, delta: isize, out: &mut Vec<Command>) {
        let before = self.highlighted_key_owned();
        self.history.move_highlight(delta);
        self.sync_selection(before, out);
    }

    fn jump_highlight(&mut self, index: usize, out: &mut Vec<Command>) {
        let before = self.highlighted_key_owned();
        self.history.set_highlight(index);
        self.sync_selection(before, out);
    }

    fn next_page(&mut self, out: &mut Vec<Command>) {
        match self.history.advance() {
            Advance::Buffered => self.page_replaced(out),
            Advance::Fetch { cursor } => {
                let pattern = self.filter.pattern();
                self.request_listing(Placement::Append, pattern, cursor, out);
            }
            Advance::Exhausted => {
                self.notify(NotificationKind::Warning, "no more keys", out);
            }
        }
    }

    fn previous_page(&mut self, out: &mut Vec<Command>) {
        if self.history.retreat() {
            self.page_replaced(out);
        }
    }

    fn begin_edit(&mut self, out: &mut Vec<Command>) {
        let Some(key) = self.highlighted_key_owned() else {
            return;
        };

        let staged = match self.panel.payload() {
            Some(ValuePayload::Text(text)) if self.panel.key() == key => text.clone(),
            Some(payload) if self.panel.key() == key => {
                let text = format!(
                    "only string values can be edited; {key:?} is a {}",
                    payload.key_type().as_str()
                );
                self.notify(NotificationKind::Warning, text, out);
                return;
            }
            _ => {
                self.notify(NotificationKind::Warning, "value not loaded yet", out);
                return;
            }
        };

        self.edit = Some(EditBuffer { key, staged });
        self.mode = Mode::EditingValue;
    }

    fn switch_database(&mut self, delta: i32, out: &mut Vec<Command>) {
        if let Some(index) = self.tabs.switch(delta) {
            out.push(Command::SwitchDatabase {
                handle: self.tabs.handle(),
                index,
            });
        }
    }

    fn delete_highlighted(&mut self, out: &mut Vec<Command>) {
        if let Some(key) = self.highlighted_key_owned() {
            out.push(Command::DeleteKey {
                handle: self.tabs.handle(),
                key,
            });
        }
    }

    fn delete_visible(&mut self, out: &mut Vec<Command>) {
        let keys = self
            .visible_keys()
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if keys.is_empty() {
            return;
        }
        out.push(Command::BulkDelete {
            handle: self.tabs.handle(),
            keys,
        });
    }

    fn copy_value(&mut self, out: &mut Vec<Command>) {
        match self.panel.payload() {
            Some(payload) => out.push(Command::CopyToClipboard {
                text: payload.to_plain_text(),
            }),
            None => self.notify(NotificationKind::Warning, "nothing to copy", out),
        }
    }

    fn apply_listing(&mut self, listing: ListingId, page: KeyPage, out: &mut Vec<Command>) {
        let Some(pending) = self
            .pending_listing
            .filter(|pending| pending.listing == listing)
        else {
            return;
        };
        self.pending_listing = None;

        match pending.placement {
            Placement::Reset => {
                self.history.reset(page);
                self.page_replaced(out);
            }
            Placement::Append => {
                if self.history.push_page(page) {
                    self.page_replaced(out);
                }
            }
        }
    }

    fn request_listing(
        &mut self,
        placement: Placement,
        pattern: String,
        cursor: u64,
        out: &mut Vec<Command>,
    ) {
        if placement == Placement::Append && self.pending_listing.is_some() {
            return;
        }

        let listing = self.next_listing;
        self.next_listing = listing.next();
        self.pending_listing = Some(PendingListing { listing, placement });
        out.push(Command::ListKeys {
            listing,
            handle: self.tabs.handle(),
            pattern,
            cursor,
            count: self.settings.page_size,
        });
    }

    fn remove_keys(&mut self, keys: &[String], out: &mut Vec<Command>) {
        let before = self.highlighted_key_owned();
        self.history.remove_keys(keys);
        if self.history.current_page().is_empty() {
            self.panel.clear();
        } else {
            self.sync_selection(before, out);
        }
    }

    fn sync_selection(&mut self, before: Option<String>, out: &mut Vec<Command>) {
        if self.history.highlighted_key() == before.as_deref() {
            return;
        }
        self.page_replaced(out);
    }

    fn page_replaced(&mut self, out: &mut Vec<Command>) {
        self.panel.clear();
        if let Some(key) = self.history.highlighted_key() {
            out.push(Command::FetchValue {
                handle: self.tabs.handle(),
                key: key.to_owned(),
            });
        }
    }

    fn notify(&mut self, kind: NotificationKind, text: impl Into<String>, out: &mut Vec<Command>) {
        let lifetime = match kind {
            NotificationKind::Error => self.settings.error_lifetime,
            NotificationKind::Info | NotificationKind::Warning => {
                self.settings.notification_lifetime
            }
        };
        let id = self.notifications.raise(kind, text, lifetime);
        out.push(Command::ExpireNotification {
            id,
            after: lifetime,
        });
    }

    /// A value result applies only to the highlighted key on the active handle.
    fn is_current(&self, handle: HandleId, key: &str) -> bool {
        handle == self.tabs.handle() && self.history.highlighted_key() == Some(key)
    }

    fn highlighted_key_owned(&self) -> Option<String> {
        self.history.highlighted_key().map(str::to_owned)
    }

    /// Keys the operator currently sees: the whole page, or the live preview
    /// subset while a filter is being typed.
    pub fn visible_keys(&self) -> Vec<&str> {
        let keys = self.history.current_page().keys().iter();
        if self.mode == Mode::Filtering {
            keys.filter(|key| self.filter.previews(key))
                .map(String::as_str)
                .collect()
        } else {
            keys.map(String::as_str).collect()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn terminal_size(&self) -> TerminalSize {
        self.terminal_size
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn databases(&self) -> &DatabaseSelector {
        &self.tabs
    }

    pub fn active_database(&self) -> u16 {
        self.tabs.active()
    }

    pub fn handle(&self) -> HandleId {
        self.tabs.handle()
    }

    pub fn history(&self) -> &KeyPageHistory {
        &self.history
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn panel(&self) -> &ValuePanel {
        &self.panel
    }

    pub fn edit(&self) -> Option<&EditBuffer> {
        self.edit.as_ref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.current()
    }

    pub fn is_listing_pending(&self) -> bool {
        self.pending_listing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, Event, Session, SessionSettings};
    use crate::{
        ErrorKind, HandleId, Key, KeyPage, ListingId, Mode, NotificationKind, Operation, Ttl,
        ValuePayload,
    };

    fn page(keys: &[&str], cursor: u64) -> KeyPage {
        KeyPage::new(keys.iter().map(|key| (*key).to_owned()).collect(), cursor)
    }

    fn press(session: Session, key: Key) -> (Session, Vec<Command>) {
        session.reduce(Event::KeyPressed(key))
    }

    fn listing_in(commands: &[Command]) -> ListingId {
        commands
            .iter()
            .find_map(|command| match command {
                Command::ListKeys { listing, .. } => Some(*listing),
                _ => None,
            })
            .expect("commands should include a listing")
    }

    fn fetches(commands: &[Command]) -> Vec<&str> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::FetchValue { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    fn has_listing(commands: &[Command]) -> bool {
        commands
            .iter()
            .any(|command| matches!(command, Command::ListKeys { .. }))
    }

    fn text(value: &str) -> ValuePayload {
        ValuePayload::Text(value.to_owned())
    }

    /// Session on db0 showing `keys` with the first key's value loaded.
    fn listed(keys: &[&str], cursor: u64) -> Session {
        let session = Session::new(SessionSettings::default(), 0, HandleId::new(1));
        let (session, commands) = session.reduce(Event::Started {
            endpoint: "redis://127.0.0.1:6379/0".to_owned(),
        });
        let listing = listing_in(&commands);
        let (session, _) = session.reduce(Event::KeysListed {
            listing,
            page: page(keys, cursor),
        });
        match keys.first() {
            Some(first) => {
                session
                    .reduce(Event::ValueFetched {
                        handle: HandleId::new(1),
                        key: (*first).to_owned(),
                        payload: text("v"),
                        ttl: Ttl::Persistent,
                    })
                    .0
            }
            None => session,
        }
    }

    #[test]
    fn startup_lists_all_keys_and_announces_connection() {
        let session = Session::new(SessionSettings::default(), 0, HandleId::new(7));
        let (session, commands) = session.reduce(Event::Started {
            endpoint: "redis://localhost:6379/0".to_owned(),
        });

        assert!(commands.contains(&Command::ListKeys {
            listing: ListingId::new(1),
            handle: HandleId::new(7),
            pattern: "*".to_owned(),
            cursor: 0,
            count: 40,
        }));
        let notification = session.notification().expect("startup notification");
        assert_eq!(notification.kind, NotificationKind::Info);
        assert!(notification.text.contains("redis://localhost:6379/0"));
        assert_eq!(session.endpoint(), "redis://localhost:6379/0");
    }

    #[test]
    fn first_listing_fetches_highlighted_value() {
        let session = Session::new(SessionSettings::default(), 0, HandleId::new(1));
        let (session, commands) = session.reduce(Event::Started {
            endpoint: String::new(),
        });
        let (session, commands) = session.reduce(Event::KeysListed {
            listing: listing_in(&commands),
            page: page(&["a", "b"], 0),
        });
        assert_eq!(fetches(&commands), vec!["a"]);
        assert_eq!(session.history().highlighted_key(), Some("a"));
    }

    #[test]
    fn moving_highlight_fetches_only_when_key_changes() {
        let session = listed(&["a", "b"], 0);

        let (session, commands) = press(session, Key::Char('k'));
        assert!(commands.is_empty());
        assert!(session.panel().is_loaded());

        let (session, commands) = press(session, Key::Down);
        assert_eq!(fetches(&commands), vec!["b"]);
        assert!(!session.panel().is_loaded());

        let (_, commands) = press(session, Key::Char('j'));
        assert!(commands.is_empty());
    }

    #[test]
    fn stale_value_for_previous_key_is_dropped() {
        let session = listed(&["a", "b"], 0);
        let (session, _) = press(session, Key::Down);

        let (session, _) = session.reduce(Event::ValueFetched {
            handle: HandleId::new(1),
            key: "a".to_owned(),
            payload: text("old"),
            ttl: Ttl::Expires(3),
        });
        assert!(!session.panel().is_loaded());

        let (session, _) = session.reduce(Event::ValueFetched {
            handle: HandleId::new(1),
            key: "b".to_owned(),
            payload: text("fresh"),
            ttl: Ttl::Expires(9),
        });
        assert_eq!(session.panel().key(), "b");
        assert_eq!(session.panel().payload(), Some(&text("fresh")));
        assert_eq!(session.panel().ttl(), Ttl::Expires(9));
    }

    #[test]
    fn advance_fetches_once_then_replays_buffered_page() {
        let session = listed(&["a", "b", "c"], 5);

        let (session, commands) = press(session, Key::Char('n'));
        let listing = listing_in(&commands);
        assert_eq!(
            commands,
            vec![Command::ListKeys {
                listing,
                handle: HandleId::new(1),
                pattern: "*".to_owned(),
                cursor: 5,
                count: 40,
            }]
        );

        let (session, commands) = session.reduce(Event::KeysListed {
            listing,
            page: page(&["d", "e"], 0),
        });
        assert_eq!(session.history().history_index(), 1);
        assert_eq!(fetches(&commands), vec!["d"]);

        let (session, commands) = press(session, Key::Char('p'));
        assert_eq!(session.history().history_index(), 0);
        assert_eq!(fetches(&commands), vec!["a"]);

        let (session, commands) = press(session, Key::Char('n'));
        assert!(!has_listing(&commands));
        assert_eq!(fetches(&commands), vec!["d"]);
        assert_eq!(session.history().history_index(), 1);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn advance_while_fetch_in_flight_does_not_stack_requests() {
        let session = listed(&["a"], 5);
        let (session, first) = press(session, Key::Char('n'));
        assert!(has_listing(&first));
        let (_, second) = press(session, Key::Right);
        assert!(!has_listing(&second));
    }

    #[test]
    fn advance_past_last_page_warns() {
        let session = listed(&["a"], 0);
        let (session, commands) = press(session, Key::Char('n'));
        assert!(!has_listing(&commands));
        assert_eq!(
            session.notification().map(|n| n.kind),
            Some(NotificationKind::Warning)
        );
    }

    #[test]
    fn empty_listing_clears_value_panel_immediately() {
        let session = listed(&["a"], 0);
        assert!(session.panel().is_loaded());

        let (session, commands) = press(session, Key::Char('r'));
        let (session, commands_after) = session.reduce(Event::KeysListed {
            listing: listing_in(&commands),
            page: page(&[], 0),
        });
        assert!(fetches(&commands_after).is_empty());
        assert!(!session.panel().is_loaded());
        assert!(session.history().highlighted_key().is_none());
    }

    #[test]
    fn superseded_listing_is_dropped() {
        let session = listed(&["a"], 0);
        let (session, old) = press(session, Key::Char('r'));
        let (session, new) = press(session, Key::Char('r'));

        let (session, _) = session.reduce(Event::KeysListed {
            listing: listing_in(&old),
            page: page(&["stale"], 0),
        });
        assert_eq!(session.history().current_page().keys(), ["a"]);

        let (session, _) = session.reduce(Event::KeysListed {
            listing: listing_in(&new),
            page: page(&["fresh"], 0),
        });
        assert_eq!(session.history().current_page().keys(), ["fresh"]);
    }

    #[test]
    fn filter_commit_issues_pattern_listing_and_cancel_restores_display() {
        let session = listed(&["user:1", "order:1"], 0);
        let (session, _) = press(session, Key::Char('/'));
        assert_eq!(session.mode(), Mode::Filtering);

        let (session, _) = press(session, Key::Char('u'));
        let (session, _) = press(session, Key::Char('s'));
        assert_eq!(session.visible_keys(), vec!["user:1"]);

        let (session, commands) = press(session, Key::Enter);
        assert_eq!(session.mode(), Mode::Listing);
        let listing = listing_in(&commands);
        assert!(commands.iter().any(|command| matches!(
            command,
            Command::ListKeys { pattern, cursor: 0, .. } if pattern == "*us*"
        )));
        let (session, _) = session.reduce(Event::KeysListed {
            listing,
            page: page(&["user:1"], 0),
        });

        let committed_view = session.clone();
        let (session, _) = press(session, Key::Char('/'));
        let (session, _) = press(session, Key::Backspace);
        let (session, _) = press(session, Key::Char('z'));
        assert_eq!(session.filter().query_text(), "uz");
        let (session, commands) = press(session, Key::Esc);

        assert!(commands.is_empty());
        assert_eq!(session.mode(), Mode::Listing);
        assert_eq!(session.filter().query_text(), "us");
        assert_eq!(session.view(), committed_view.view());
    }

    #[test]
    fn quit_keys_are_swallowed_while_filtering() {
        let session = listed(&["a"], 0);
        let (session, _) = press(session, Key::Char('/'));
        let (session, commands) = press(session, Key::Char('q'));
        assert!(!commands.contains(&Command::Quit));
        assert_eq!(session.filter().query_text(), "q");

        let (session, commands) = press(session, Key::Ctrl('c'));
        assert!(!commands.contains(&Command::Quit));
        assert_eq!(session.mode(), Mode::Listing);

        for key in [Key::Char('q'), Key::Esc, Key::Ctrl('c')] {
            let (_, commands) = press(session.clone(), key);
            assert_eq!(commands, vec![Command::Quit]);
        }
    }

    #[test]
    fn edit_flow_stages_and_sets_value() {
        let session = listed(&["greeting"], 0);
        let (session, _) = press(session, Key::Enter);
        assert_eq!(session.mode(), Mode::EditingValue);
        assert_eq!(session.edit().map(|edit| edit.staged.as_str()), Some("v"));

        let (session, _) = press(session, Key::Backspace);
        let (session, _) = press(session, Key::Char('h'));
        let (session, _) = press(session, Key::Char('i'));
        let (session, commands) = press(session, Key::Enter);
        assert_eq!(session.mode(), Mode::Listing);
        assert_eq!(
            commands,
            vec![Command::SetValue {
                handle: HandleId::new(1),
                key: "greeting".to_owned(),
                value: "hi".to_owned(),
            }]
        );

        let (session, _) = session.reduce(Event::ValueSet {
            handle: HandleId::new(1),
            key: "greeting".to_owned(),
            value: "hi".to_owned(),
        });
        assert_eq!(session.panel().payload(), Some(&text("hi")));
    }

    #[test]
    fn edit_escape_discards_staged_text() {
        let session = listed(&["greeting"], 0);
        let (session, _) = press(session, Key::Enter);
        let (session, _) = press(session, Key::Char('!'));
        let (session, commands) = press(session, Key::Esc);
        assert!(commands.is_empty());
        assert!(session.edit().is_none());
        assert_eq!(session.mode(), Mode::Listing);
        assert_eq!(session.panel().payload(), Some(&text("v")));
    }

    #[test]
    fn editing_structured_value_is_refused() {
        let session = listed(&["h"], 0);
        let (session, _) = session.reduce(Event::ValueFetched {
            handle: HandleId::new(1),
            key: "h".to_owned(),
            payload: ValuePayload::Hash(vec![("f".to_owned(), "v".to_owned())]),
            ttl: Ttl::Persistent,
        });
        let (session, _) = press(session, Key::Enter);
        assert_eq!(session.mode(), Mode::Listing);
        assert_eq!(
            session.notification().map(|n| n.kind),
            Some(NotificationKind::Warning)
        );
    }

    #[test]
    fn help_absorbs_next_key() {
        let session = listed(&["a"], 0);
        let (session, _) = press(session, Key::Char('?'));
        assert_eq!(session.mode(), Mode::Help);
        let (session, commands) = press(session, Key::Char('q'));
        assert!(commands.is_empty());
        assert_eq!(session.mode(), Mode::Listing);
    }

    #[test]
    fn deleting_only_key_empties_page_and_clears_panel() {
        let session = listed(&["solo"], 0);
        let (session, commands) = press(session, Key::Char('x'));
        assert_eq!(
            commands,
            vec![Command::DeleteKey {
                handle: HandleId::new(1),
                key: "solo".to_owned(),
            }]
        );

        let (session, commands) = session.reduce(Event::KeyDeleted {
            handle: HandleId::new(1),
            key: "solo".to_owned(),
        });
        assert!(fetches(&commands).is_empty());
        assert!(session.history().current_page().is_empty());
        assert_eq!(session.history().highlight(), 0);
        assert!(!session.panel().is_loaded());
    }

    #[test]
    fn deleting_last_key_collapses_highlight() {
        let session = listed(&["a", "b", "c"], 0);
        let (session, _) = press(session, Key::End);
        assert_eq!(session.history().highlight(), 2);

        let (session, commands) = session.reduce(Event::KeyDeleted {
            handle: HandleId::new(1),
            key: "c".to_owned(),
        });
        assert_eq!(session.history().highlight(), 1);
        assert_eq!(fetches(&commands), vec!["b"]);
    }

    #[test]
    fn deleting_key_above_highlight_keeps_selection() {
        let session = listed(&["a", "b", "c"], 0);
        let (session, _) = press(session, Key::Down);
        let (session, _) = session.reduce(Event::ValueFetched {
            handle: HandleId::new(1),
            key: "b".to_owned(),
            payload: text("bee"),
            ttl: Ttl::Persistent,
        });

        let (session, commands) = session.reduce(Event::KeyDeleted {
            handle: HandleId::new(1),
            key: "a".to_owned(),
        });
        assert_eq!(session.history().highlight(), 0);
        assert_eq!(session.history().highlighted_key(), Some("b"));
        assert!(fetches(&commands).is_empty());
        assert!(session.panel().is_loaded());
    }

    #[test]
    fn failed_delete_keeps_key_and_raises_error() {
        let session = listed(&["a"], 0);
        let (session, commands) = session.reduce(Event::OperationFailed {
            operation: Operation::DeleteKey {
                key: "a".to_owned(),
            },
            kind: ErrorKind::Operation,
            message: "READONLY".to_owned(),
        });
        assert_eq!(session.history().current_page().keys(), ["a"]);
        let notification = session.notification().expect("error shown");
        assert_eq!(notification.kind, NotificationKind::Error);
        assert!(notification.text.contains("READONLY"));
        assert!(matches!(
            commands.as_slice(),
            [Command::ExpireNotification { .. }]
        ));
    }

    #[test]
    fn bulk_delete_targets_visible_keys_and_relists() {
        let session = listed(&["a", "b"], 0);
        let (session, commands) = press(session, Key::Char('X'));
        assert_eq!(
            commands,
            vec![Command::BulkDelete {
                handle: HandleId::new(1),
                keys: vec!["a".to_owned(), "b".to_owned()],
            }]
        );

        let (session, commands) = session.reduce(Event::KeysDeleted {
            handle: HandleId::new(1),
            keys: vec!["a".to_owned(), "b".to_owned()],
        });
        assert!(session.history().current_page().is_empty());
        assert!(!session.panel().is_loaded());
        assert!(has_listing(&commands));
    }

    #[test]
    fn notification_expiry_only_clears_matching_id() {
        let session = listed(&["a"], 0);
        let (session, first) = press(session, Key::Char('n'));
        let (session, second) = session.reduce(Event::Copied);

        let id_of = |commands: &[Command]| {
            commands
                .iter()
                .find_map(|command| match command {
                    Command::ExpireNotification { id, .. } => Some(*id),
                    _ => None,
                })
                .expect("expiry scheduled")
        };
        let first_id = id_of(&first);
        let second_id = id_of(&second);
        assert_ne!(first_id, second_id);

        let (session, _) = session.reduce(Event::NotificationExpired(first_id));
        assert_eq!(
            session.notification().map(|n| n.text.as_str()),
            Some("copied value to clipboard")
        );
        let (session, _) = session.reduce(Event::NotificationExpired(second_id));
        assert!(session.notification().is_none());
    }

    #[test]
    fn failed_switch_leaves_database_and_history_untouched() {
        let session = listed(&["a", "b"], 0);
        let history_before = session.history().clone();

        let (session, commands) = press(session, Key::Tab);
        assert_eq!(
            commands,
            vec![Command::SwitchDatabase {
                handle: HandleId::new(1),
                index: 1,
            }]
        );

        let (session, commands) = session.reduce(Event::OperationFailed {
            operation: Operation::SwitchDatabase { index: 1 },
            kind: ErrorKind::Connection,
            message: "connection refused".to_owned(),
        });
        assert_eq!(session.active_database(), 0);
        assert_eq!(session.handle(), HandleId::new(1));
        assert_eq!(session.history(), &history_before);
        let expiries = commands
            .iter()
            .filter(|command| matches!(command, Command::ExpireNotification { .. }))
            .count();
        assert_eq!(expiries, 1);
        assert_eq!(
            session.notification().map(|n| n.kind),
            Some(NotificationKind::Error)
        );
    }

    #[test]
    fn successful_switch_resets_listing_and_uses_new_handle() {
        let session = listed(&["a"], 0);
        let (session, _) = press(session, Key::Char('/'));
        let (session, _) = press(session, Key::Char('a'));
        let (session, commands) = press(session, Key::Enter);
        let (session, _) = session.reduce(Event::KeysListed {
            listing: listing_in(&commands),
            page: page(&["a"], 0),
        });
        assert!(session.filter().is_committed());

        let (session, _) = press(session, Key::BackTab);
        let (session, commands) = session.reduce(Event::DatabaseSwitched {
            index: 15,
            handle: HandleId::new(2),
        });

        assert_eq!(session.active_database(), 15);
        assert!(!session.filter().is_committed());
        assert!(session.history().current_page().is_empty());
        assert!(!session.panel().is_loaded());
        assert!(commands.iter().any(|command| matches!(
            command,
            Command::ListKeys { handle, pattern, cursor: 0, .. }
                if *handle == HandleId::new(2) && pattern == "*"
        )));
    }

    #[test]
    fn commands_capture_handle_at_issue_time() {
        let session = listed(&["a", "b"], 0);
        let (session, _) = press(session, Key::Tab);
        let (session, before_switch) = press(session, Key::Down);
        assert!(before_switch.iter().any(|command| matches!(
            command,
            Command::FetchValue { handle, .. } if *handle == HandleId::new(1)
        )));

        let (session, after_switch) = session.reduce(Event::DatabaseSwitched {
            index: 1,
            handle: HandleId::new(2),
        });
        assert!(after_switch.iter().all(|command| match command {
            Command::ListKeys { handle, .. } => *handle == HandleId::new(2),
            _ => true,
        }));
        assert_eq!(session.handle(), HandleId::new(2));
    }

    /// Session that moved from db0 (handle 1) to db1 (handle 2), where db1
    /// lists `a` and `b` and shows db1's value for `a`.
    fn moved_to_second_database() -> Session {
        let session = listed(&["a"], 0);
        let (session, _) = press(session, Key::Tab);
        let (session, commands) = session.reduce(Event::DatabaseSwitched {
            index: 1,
            handle: HandleId::new(2),
        });
        let (session, _) = session.reduce(Event::KeysListed {
            listing: listing_in(&commands),
            page: page(&["a", "b"], 0),
        });
        session
            .reduce(Event::ValueFetched {
                handle: HandleId::new(2),
                key: "a".to_owned(),
                payload: text("db1"),
                ttl: Ttl::Persistent,
            })
            .0
    }

    #[test]
    fn late_value_from_previous_database_is_dropped() {
        let session = moved_to_second_database();
        assert_eq!(session.active_database(), 1);

        let (session, _) = session.reduce(Event::ValueFetched {
            handle: HandleId::new(1),
            key: "a".to_owned(),
            payload: text("db0"),
            ttl: Ttl::Expires(4),
        });
        assert_eq!(session.panel().payload(), Some(&text("db1")));
        assert_eq!(session.panel().ttl(), Ttl::Persistent);

        let (session, _) = session.reduce(Event::ValueSet {
            handle: HandleId::new(1),
            key: "a".to_owned(),
            value: "written to db0".to_owned(),
        });
        assert_eq!(session.panel().payload(), Some(&text("db1")));
        let notification = session.notification().expect("update still announced");
        assert_eq!(notification.kind, NotificationKind::Info);
    }

    #[test]
    fn late_delete_from_previous_database_keeps_current_listing() {
        let session = moved_to_second_database();

        let (session, commands) = session.reduce(Event::KeyDeleted {
            handle: HandleId::new(1),
            key: "a".to_owned(),
        });
        assert_eq!(session.visible_keys(), vec!["a", "b"]);
        assert!(fetches(&commands).is_empty());
        assert!(session.panel().is_loaded());
        assert!(
            session
                .notification()
                .is_some_and(|n| n.text.contains("deleted"))
        );

        let (session, commands) = session.reduce(Event::KeysDeleted {
            handle: HandleId::new(1),
            keys: vec!["a".to_owned(), "b".to_owned()],
        });
        assert_eq!(session.visible_keys(), vec!["a", "b"]);
        assert!(!has_listing(&commands));
        assert!(!session.is_listing_pending());
        assert_eq!(session.panel().key(), "a");
    }

    #[test]
    fn delete_on_active_handle_after_switch_updates_listing() {
        let session = moved_to_second_database();
        let (session, commands) = session.reduce(Event::KeysDeleted {
            handle: HandleId::new(2),
            keys: vec!["b".to_owned()],
        });
        assert_eq!(session.visible_keys(), vec!["a"]);
        assert!(has_listing(&commands));
    }

    #[test]
    fn copy_sends_payload_text() {
        let session = listed(&["a"], 0);
        let (_, commands) = press(session, Key::Char('y'));
        assert_eq!(
            commands,
            vec![Command::CopyToClipboard {
                text: "v".to_owned()
            }]
        );
    }

    #[test]
    fn tick_refreshes_highlighted_value_only_in_listing() {
        let session = listed(&["a"], 0);
        let (session, commands) = session.reduce(Event::Tick);
        assert_eq!(fetches(&commands), vec!["a"]);

        let (session, _) = press(session, Key::Char('/'));
        let (_, commands) = session.reduce(Event::Tick);
        assert!(commands.is_empty());
    }

    #[test]
    fn resize_updates_terminal_size() {
        let session = listed(&[], 0);
        let (session, commands) = session.reduce(Event::Resized { rows: 50, cols: 120 });
        assert!(commands.is_empty());
        assert_eq!(session.terminal_size().rows, 50);
        assert_eq!(session.terminal_size().cols, 120);
    }
}
