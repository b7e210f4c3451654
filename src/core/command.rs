//! Command definitions
//!
//! A command is plain data supplied by the embedding application: a name,
//! a description, an optional argument vocabulary used for suggestions, and
//! a handler. The engine never inspects what a handler does.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use super::session::ExecutionContext;

/// Result produced by a command handler
pub type HandlerResult = anyhow::Result<()>;

/// Type-erased handler stored in a definition
pub type CommandHandler =
    Arc<dyn Fn(Vec<String>, ExecutionContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A registered command
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    pub available_arguments: Vec<String>,
    handler: CommandHandler,
}

impl CommandDefinition {
    /// Define a command with an asynchronous handler
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<String>, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            available_arguments: Vec::new(),
            handler: Arc::new(move |args: Vec<String>, ctx: ExecutionContext| {
                handler(args, ctx).boxed()
            }),
        }
    }

    /// Define a command whose handler completes synchronously
    pub fn new_sync<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[String], &ExecutionContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            available_arguments: Vec::new(),
            handler: Arc::new(move |args: Vec<String>, ctx: ExecutionContext| {
                future::ready(handler(args.as_slice(), &ctx)).boxed()
            }),
        }
    }

    /// Attach the argument vocabulary offered as `"<name> <argument>"` suggestions
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn invoke(
        &self,
        args: Vec<String>,
        ctx: ExecutionContext,
    ) -> BoxFuture<'static, HandlerResult> {
        (self.handler)(args, ctx)
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("available_arguments", &self.available_arguments)
            .finish_non_exhaustive()
    }
}

/// A submitted line split into command token and arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLine {
    pub command: String,
    pub args: Vec<String>,
}

/// Split a line on whitespace. Returns `None` for blank input.
///
/// There is no quoting or escaping: `echo "a b"` yields the arguments
/// `"a` and `b"`.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let mut tokens = line.split_whitespace();
    let command = tokens.next()?.to_string();
    Some(ParsedLine {
        command,
        args: tokens.map(str::to_string).collect(),
    })
}
