//! shellfolio - a portfolio site that behaves like a shell
//!
//! The interesting part is the terminal session engine in [`core`]: it owns
//! the input line, command history, autocomplete vocabulary and output
//! transcript, and runs registered commands one at a time with cooperative
//! cancellation.
//!
//! # Example
//!
//! ```no_run
//! use shellfolio::core::{CommandDefinition, SessionOptions, TerminalSession};
//!
//! # async fn demo() {
//! let echo = CommandDefinition::new_sync("echo", "Print arguments", |args, ctx| {
//!     ctx.append_output(args.join(" "));
//!     Ok(())
//! });
//! let session = TerminalSession::new(vec![echo], SessionOptions::default());
//!
//! session.set_input("ec");
//! session.autocomplete_suggestion();
//! assert_eq!(session.input(), "echo");
//!
//! session.set_input("echo hello world");
//! session.execute().await.unwrap();
//! assert_eq!(session.messages()[1].text, "hello world");
//! # }
//! ```

pub mod config;
pub mod core;
pub mod history;
