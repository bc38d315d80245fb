// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const MATCH_ALL: &str = "*";

/// Live filter text plus the last committed pattern. The two are tracked
/// separately so cancelling an edit restores the committed display exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    query: String,
    committed: Option<String>,
}

impl FilterState {
    /// Starts an edit from the committed text.
    pub fn begin(&mut self) {
        self.query = self.committed.clone().unwrap_or_default();
    }

    pub fn type_char(&mut self, value: char) {
        self.query.push(value);
    }

    pub fn backspace(&mut self) {
        self.query.pop();
    }

    /// Commits the live text and returns the server-side pattern for it.
    pub fn commit(&mut self) -> String {
        self.committed = if self.query.is_empty() {
            None
        } else {
            Some(self.query.clone())
        };
        self.pattern()
    }

    pub fn cancel(&mut self) {
        self.begin();
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.committed = None;
    }

    pub fn query_text(&self) -> &str {
        &self.query
    }

    pub fn committed_text(&self) -> Option<&str> {
        self.committed.as_deref()
    }

    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Pattern for the committed filter, `*` when none is active.
    pub fn pattern(&self) -> String {
        self.committed
            .as_deref()
            .map_or_else(|| MATCH_ALL.to_owned(), glob_pattern)
    }

    /// Live preview predicate used while the operator is typing.
    pub fn previews(&self, key: &str) -> bool {
        self.query.is_empty() || key.contains(self.query.as_str())
    }
}

/// Text with glob metacharacters is used verbatim; plain text matches as a
/// substring.
pub fn glob_pattern(text: &str) -> String {
    if text.is_empty() {
        return MATCH_ALL.to_owned();
    }
    if text.contains(['*', '?', '[']) {
        return text.to_owned();
    }
    format!("*{text}*")
}
