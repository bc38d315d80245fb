// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::KeyPage;

/// Outcome of asking the history for the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A previously fetched page was already buffered; the index moved.
    Buffered,
    /// The tail page has a continuation cursor; the caller must fetch it.
    Fetch { cursor: u64 },
    /// No buffered page and no cursor left.
    Exhausted,
}

/// Append-only stack of fetched key pages plus the page and key currently
/// shown. There is always at least one (possibly empty) page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPageHistory {
    pages: Vec<KeyPage>,
    index: usize,
    highlight: usize,
}

impl Default for KeyPageHistory {
    fn default() -> Self {
        Self {
            pages: vec![KeyPage::default()],
            index: 0,
            highlight: 0,
        }
    }
}

impl KeyPageHistory {
    /// Drops every page and starts over from `page`.
    pub fn reset(&mut self, page: KeyPage) {
        self.pages = vec![page];
        self.index = 0;
        self.highlight = 0;
    }

    /// Appends a freshly fetched page after the tail. The view follows the
    /// new page only when it was showing the old tail; returns whether it did.
    pub fn push_page(&mut self, page: KeyPage) -> bool {
        let was_at_tail = self.index + 1 == self.pages.len();
        self.pages.push(page);
        if was_at_tail {
            self.index = self.pages.len() - 1;
            self.highlight = 0;
        }
        was_at_tail
    }

    pub fn has_buffered_next(&self) -> bool {
        self.index + 1 < self.pages.len()
    }

    pub fn can_advance(&self) -> bool {
        self.has_buffered_next() || self.tail_page().has_more()
    }

    pub fn can_retreat(&self) -> bool {
        self.index > 0
    }

    pub fn advance(&mut self) -> Advance {
        if self.has_buffered_next() {
            self.index += 1;
            self.highlight = 0;
            return Advance::Buffered;
        }

        let cursor = self.tail_page().cursor();
        if cursor == 0 {
            Advance::Exhausted
        } else {
            Advance::Fetch { cursor }
        }
    }

    pub fn retreat(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        self.index -= 1;
        self.highlight = 0;
        true
    }

    pub fn current_page(&self) -> &KeyPage {
        &self.pages[self.index]
    }

    pub fn tail_page(&self) -> &KeyPage {
        &self.pages[self.pages.len() - 1]
    }

    pub fn history_index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(KeyPage::is_empty)
    }

    pub fn highlight(&self) -> usize {
        self.highlight
    }

    pub fn highlighted_key(&self) -> Option<&str> {
        self.current_page().get(self.highlight)
    }

    pub fn move_highlight(&mut self, delta: isize) {
        let target = self.highlight.saturating_add_signed(delta);
        self.set_highlight(target);
    }

    pub fn set_highlight(&mut self, index: usize) {
        let last = self.current_page().len().saturating_sub(1);
        self.highlight = index.min(last);
    }

    /// Supersedes every page with a copy lacking `keys` and keeps the
    /// highlight on a valid position of the current page.
    pub fn remove_keys(&mut self, keys: &[String]) {
        let removed_before = self
            .current_page()
            .keys()
            .iter()
            .take(self.highlight)
            .filter(|key| keys.contains(key))
            .count();

        self.pages = self.pages.iter().map(|page| page.without(keys)).collect();
        self.set_highlight(self.highlight - removed_before);
    }
}
