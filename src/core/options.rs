//! Session construction options
//!
//! Change notification is delivered through optional callbacks set here.
//! Callbacks see changes in the same order as the transcript and never run
//! concurrently with each other. They run without the session's internal
//! lock held, on whichever thread is delivering; when two threads append at
//! once, one of them may deliver the other's change.

use std::fmt;
use std::sync::Arc;

use super::message::{TerminalMessage, TranscriptChange};

/// Called after every transcript append or clear
pub type TranscriptHook = Arc<dyn Fn(&TranscriptChange) + Send + Sync>;

/// Called after every output-type message is appended
pub type OutputHook = Arc<dyn Fn(&TerminalMessage) + Send + Sync>;

#[derive(Clone, Default)]
pub struct SessionOptions {
    /// Maximum history entries, unbounded when `None`
    pub history_limit: Option<usize>,
    pub on_transcript_changed: Option<TranscriptHook>,
    pub on_output_appended: Option<OutputHook>,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn on_transcript_changed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TranscriptChange) + Send + Sync + 'static,
    {
        self.on_transcript_changed = Some(Arc::new(hook));
        self
    }

    pub fn on_output_appended<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TerminalMessage) + Send + Sync + 'static,
    {
        self.on_output_appended = Some(Arc::new(hook));
        self
    }

    pub(crate) fn notify(&self, change: &TranscriptChange) {
        if let Some(hook) = &self.on_transcript_changed {
            hook(change);
        }
        if let TranscriptChange::Appended(message) = change {
            if !message.is_input() {
                if let Some(hook) = &self.on_output_appended {
                    hook(message);
                }
            }
        }
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("history_limit", &self.history_limit)
            .field("on_transcript_changed", &self.on_transcript_changed.is_some())
            .field("on_output_appended", &self.on_output_appended.is_some())
            .finish()
    }
}
