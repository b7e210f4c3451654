//! Transcript messages
//!
//! The transcript is the ordered log of everything shown to the user.
//! Messages are immutable once appended.

/// Which side of the conversation a message belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A line the user submitted at the prompt
    Input,
    /// Text produced by the engine or a command handler
    Output,
}

/// A single transcript entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalMessage {
    pub kind: MessageKind,
    pub text: String,
    /// Text is markup and should be rendered rather than shown verbatim
    pub is_html: bool,
}

impl TerminalMessage {
    pub fn input(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Input,
            text: text.into(),
            is_html: false,
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Output,
            text: text.into(),
            is_html: false,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Output,
            text: text.into(),
            is_html: true,
        }
    }

    pub fn is_input(&self) -> bool {
        self.kind == MessageKind::Input
    }
}

/// A mutation of the transcript, delivered to change hooks
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptChange {
    /// A message was appended at the end
    Appended(TerminalMessage),
    /// The transcript was emptied
    Cleared,
}
