// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{NotificationId, NotificationKind};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub text: String,
    pub expires_after: Duration,
}

/// Holds at most one live notification. Every raise gets a fresh id, and an
/// expiry only clears the message it was scheduled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRegistry {
    current: Option<Notification>,
    next_id: NotificationId,
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self {
            current: None,
            next_id: NotificationId::new(1),
        }
    }
}

impl NotificationRegistry {
    pub fn raise(
        &mut self,
        kind: NotificationKind,
        text: impl Into<String>,
        lifetime: Duration,
    ) -> NotificationId {
        let id = self.next_id;
        self.next_id = id.next();
        self.current = Some(Notification {
            id,
            kind,
            text: text.into(),
            expires_after: lifetime,
        });
        id
    }

    /// Clears the display if `id` is still the one shown. Returns whether it was.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        if self.current.as_ref().is_some_and(|current| current.id == id) {
            self.current = None;
            return true;
        }
        false
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }
}
