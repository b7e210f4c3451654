//! Command history for shellfolio
//!
//! Stores submitted lines newest first and tracks a browsing cursor for
//! Up/Down navigation at the prompt. Nothing is persisted.

use std::collections::VecDeque;

/// Where the browsing cursor currently points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Editing a fresh line
    #[default]
    NotBrowsing,
    /// Showing `entries[i]`
    AtEntry(usize),
}

impl Cursor {
    pub fn index(self) -> Option<usize> {
        match self {
            Cursor::NotBrowsing => None,
            Cursor::AtEntry(i) => Some(i),
        }
    }
}

/// Command history with a navigation cursor
#[derive(Clone, Debug, Default)]
pub struct CommandHistory {
    /// Submitted lines (newest first)
    entries: VecDeque<String>,
    cursor: Cursor,
    /// Maximum entries, unbounded when `None`
    max_entries: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most `limit` entries
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            max_entries: limit,
            ..Self::default()
        }
    }

    /// Record a submitted line and stop browsing
    ///
    /// Returns true if the line was added. Blank lines and repeats of the
    /// newest entry are skipped.
    pub fn add(&mut self, command: &str) -> bool {
        self.cursor = Cursor::NotBrowsing;

        let trimmed = command.trim();
        if trimmed.is_empty() {
            return false;
        }

        // Skip if same as last command (dedup consecutive)
        if self.entries.front().is_some_and(|newest| newest == trimmed) {
            return false;
        }

        self.entries.push_front(trimmed.to_string());

        if let Some(max) = self.max_entries {
            self.entries.truncate(max);
        }
        true
    }

    /// Step towards older entries
    ///
    /// Returns the text that should replace the input, or `None` when the
    /// cursor is already at the oldest entry (or there is no history).
    pub fn previous(&mut self) -> Option<&str> {
        let next = match self.cursor {
            Cursor::NotBrowsing if !self.entries.is_empty() => 0,
            Cursor::AtEntry(i) if i + 1 < self.entries.len() => i + 1,
            _ => return None,
        };
        self.cursor = Cursor::AtEntry(next);
        self.entries.get(next).map(String::as_str)
    }

    /// Step towards newer entries
    ///
    /// Moving past the newest entry leaves browsing and yields `""`.
    /// Returns `None` when not browsing.
    pub fn next(&mut self) -> Option<&str> {
        match self.cursor {
            Cursor::NotBrowsing => None,
            Cursor::AtEntry(0) => {
                self.cursor = Cursor::NotBrowsing;
                Some("")
            }
            Cursor::AtEntry(i) => {
                self.cursor = Cursor::AtEntry(i - 1);
                self.entries.get(i - 1).map(String::as_str)
            }
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Entries newest first
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn newest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
