// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use rediscope_app::{Command, ErrorKind, Event, HandleId, Operation};
use rediscope_store::{KeyValueStore, StoreError, StoreResult, fetch_value};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

/// Destination for copied values.
pub trait ClipboardSink {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// Results delivered back to the loop. A verified database switch carries
/// the new store so the loop can register it before the session sees it.
pub enum InternalEvent {
    Session(Event),
    Switched {
        index: u16,
        store: Arc<dyn KeyValueStore>,
    },
}

/// Runs session commands. Store work happens on worker threads and reports
/// back through `tx`; handles are resolved at execution time.
pub struct Executor {
    stores: HashMap<HandleId, Arc<dyn KeyValueStore>>,
    next_handle: HandleId,
    clipboard: Box<dyn ClipboardSink>,
    tx: Sender<InternalEvent>,
}

impl Executor {
    pub fn new(clipboard: Box<dyn ClipboardSink>, tx: Sender<InternalEvent>) -> Self {
        Self {
            stores: HashMap::new(),
            next_handle: HandleId::new(1),
            clipboard,
            tx,
        }
    }

    pub fn register(&mut self, store: Arc<dyn KeyValueStore>) -> HandleId {
        let handle = self.next_handle;
        self.next_handle = handle.next();
        self.stores.insert(handle, store);
        handle
    }

    /// Drops every handle except `active`. Workers still holding a store keep
    /// it alive until they finish.
    pub fn retain_only(&mut self, active: HandleId) {
        self.stores.retain(|handle, _| *handle == active);
    }

    pub fn handle_count(&self) -> usize {
        self.stores.len()
    }

    /// Starts `command`. Returns `true` when the session asked to quit.
    pub fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return true,
            Command::ExpireNotification { id, after } => {
                let tx = self.tx.clone();
                thread::spawn(move || {
                    thread::sleep(after);
                    let _ = tx.send(InternalEvent::Session(Event::NotificationExpired(id)));
                });
            }
            Command::CopyToClipboard { text } => {
                let event = match self.clipboard.copy(&text) {
                    Ok(()) => Event::Copied,
                    Err(error) => {
                        tracing::warn!(error = %format!("{error:#}"), "clipboard copy failed");
                        Event::OperationFailed {
                            operation: Operation::CopyToClipboard,
                            kind: ErrorKind::Clipboard,
                            message: format!("{error:#}"),
                        }
                    }
                };
                let _ = self.tx.send(InternalEvent::Session(event));
            }
            Command::ListKeys {
                listing,
                handle,
                pattern,
                cursor,
                count,
            } => self.spawn(handle, Operation::ListKeys { listing }, move |store| {
                let page = store.scan_keys(&pattern, cursor, count)?;
                Ok(Event::KeysListed { listing, page })
            }),
            Command::FetchValue { handle, key } => {
                let operation = Operation::FetchValue { key: key.clone() };
                self.spawn(handle, operation, move |store| {
                    let (payload, ttl) = fetch_value(store, &key)?;
                    Ok(Event::ValueFetched {
                        handle,
                        key,
                        payload,
                        ttl,
                    })
                });
            }
            Command::SetValue { handle, key, value } => {
                let operation = Operation::SetValue { key: key.clone() };
                self.spawn(handle, operation, move |store| {
                    store.set_value(&key, &value)?;
                    Ok(Event::ValueSet { handle, key, value })
                });
            }
            Command::DeleteKey { handle, key } => {
                let operation = Operation::DeleteKey { key: key.clone() };
                self.spawn(handle, operation, move |store| {
                    store.delete_keys(std::slice::from_ref(&key))?;
                    Ok(Event::KeyDeleted { handle, key })
                });
            }
            Command::BulkDelete { handle, keys } => {
                let operation = Operation::BulkDelete { count: keys.len() };
                self.spawn(handle, operation, move |store| {
                    store.delete_keys(&keys)?;
                    Ok(Event::KeysDeleted { handle, keys })
                });
            }
            Command::SwitchDatabase { handle, index } => self.switch_database(handle, index),
        }
        false
    }

    fn spawn<F>(&self, handle: HandleId, operation: Operation, work: F)
    where
        F: FnOnce(&dyn KeyValueStore) -> StoreResult<Event> + Send + 'static,
    {
        let tx = self.tx.clone();
        let Some(store) = self.stores.get(&handle).cloned() else {
            let _ = tx.send(InternalEvent::Session(stale_handle(operation, handle)));
            return;
        };

        thread::spawn(move || {
            let event = match work(store.as_ref()) {
                Ok(event) => event,
                Err(error) => failure(operation, &error),
            };
            let _ = tx.send(InternalEvent::Session(event));
        });
    }

    fn switch_database(&self, handle: HandleId, index: u16) {
        let tx = self.tx.clone();
        let operation = Operation::SwitchDatabase { index };
        let Some(store) = self.stores.get(&handle).cloned() else {
            let _ = tx.send(InternalEvent::Session(stale_handle(operation, handle)));
            return;
        };

        thread::spawn(move || {
            let opened = store.with_database(index).and_then(|next| {
                next.ping()?;
                Ok(next)
            });
            let event = match opened {
                Ok(next) => {
                    tracing::info!(index, endpoint = %next.endpoint(), "switched database");
                    InternalEvent::Switched {
                        index,
                        store: Arc::from(next),
                    }
                }
                Err(error) => InternalEvent::Session(failure(operation, &error)),
            };
            let _ = tx.send(event);
        });
    }
}

fn failure(operation: Operation, error: &StoreError) -> Event {
    tracing::warn!(operation = operation.label(), %error, "store command failed");
    Event::OperationFailed {
        operation,
        kind: error.kind(),
        message: error.to_string(),
    }
}

fn stale_handle(operation: Operation, handle: HandleId) -> Event {
    tracing::warn!(operation = operation.label(), %handle, "command for released handle");
    Event::OperationFailed {
        operation,
        kind: ErrorKind::Connection,
        message: format!("connection handle {handle} is no longer open"),
    }
}
