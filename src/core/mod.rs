//! Core terminal session components.
//!
//! - **command**: command definitions and line parsing
//! - **suggest**: sorted completion vocabulary
//! - **message**: transcript entries and change events
//! - **options**: session construction options and change hooks
//! - **session**: the session engine and the handler execution context
//!
//! # Architecture
//!
//! ```text
//! TerminalSession
//! ├── input buffer
//! ├── CommandHistory (newest first + browsing cursor)
//! ├── Vocabulary (built from CommandDefinitions)
//! ├── transcript (Vec<TerminalMessage>)
//! └── execution state (running flag + shared halt flag)
//!         │
//!         └── ExecutionContext ──► handler futures
//! ```

pub mod command;
pub mod message;
pub mod options;
pub mod session;
pub mod suggest;

pub use command::{parse_line, CommandDefinition, CommandHandler, HandlerResult, ParsedLine};
pub use message::{MessageKind, TerminalMessage, TranscriptChange};
pub use options::{OutputHook, SessionOptions, TranscriptHook};
pub use session::{ExecOutcome, ExecutionContext, SessionError, SessionSnapshot, TerminalSession};
pub use suggest::Vocabulary;
