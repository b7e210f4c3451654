//! Terminal session engine
//!
//! Owns the input buffer, history, transcript and execution state of one
//! prompt, and dispatches submitted lines to registered commands.
//!
//! At most one handler runs at a time. Halting is cooperative: the engine
//! raises a flag and the handler decides when to stop. A handler that never
//! completes and never checks the flag keeps the session busy for good;
//! there is no timeout.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::command::{parse_line, CommandDefinition, HandlerResult};
use super::message::{TerminalMessage, TranscriptChange};
use super::options::SessionOptions;
use super::suggest::Vocabulary;
use crate::history::CommandHistory;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("command `{command}` failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// What a call to [`TerminalSession::execute`] did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Another command was in flight; the submission was dropped
    Busy,
    /// The input was blank; only an empty prompt line was recorded
    Blank,
    /// No command matched the first token
    NotFound { command: String },
    /// The handler ran to completion
    Completed { command: String },
}

/// Read-only view of the session at one instant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub input: String,
    pub suggestion: String,
    pub messages: Vec<TerminalMessage>,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
    pub is_running: bool,
}

struct SessionState {
    input: String,
    history: CommandHistory,
    messages: Vec<TerminalMessage>,
    commands: Vec<CommandDefinition>,
    vocabulary: Vocabulary,
    running: bool,
    /// Changes not yet handed to the hooks, in transcript order
    pending: VecDeque<TranscriptChange>,
}

impl SessionState {
    fn push(&mut self, message: TerminalMessage) {
        self.messages.push(message.clone());
        self.pending.push_back(TranscriptChange::Appended(message));
    }

    fn clear(&mut self) {
        self.messages.clear();
        self.pending.push_back(TranscriptChange::Cleared);
    }
}

struct Shared {
    state: Mutex<SessionState>,
    /// Held by the thread currently delivering pending changes
    dispatching: Mutex<()>,
    halted: AtomicBool,
    options: SessionOptions,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State is only touched in short sections that cannot panic midway
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver queued changes to the hooks in FIFO order
    ///
    /// Only one thread delivers at a time; others leave their changes in
    /// the queue for it. Hooks run without the state lock held, so they may
    /// read or mutate the session. Changes made from inside a hook are
    /// delivered after the current one.
    fn flush(&self) {
        loop {
            let turn = match self.dispatching.try_lock() {
                Ok(turn) => turn,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            loop {
                let batch: Vec<TranscriptChange> = self.lock().pending.drain(..).collect();
                if batch.is_empty() {
                    break;
                }
                for change in &batch {
                    self.options.notify(change);
                }
            }
            drop(turn);

            // Anything queued between the last drain and releasing the turn
            // was skipped by its producer
            if self.lock().pending.is_empty() {
                return;
            }
        }
    }

    fn append(&self, message: TerminalMessage) {
        self.lock().push(message);
        self.flush();
    }

    fn clear(&self) {
        self.lock().clear();
        self.flush();
    }
}

/// Releases the running flag when the handler finishes, fails, panics or
/// its future is dropped
struct RunningGuard {
    shared: Arc<Shared>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.shared.lock().running = false;
    }
}

enum Dispatch {
    Done(ExecOutcome),
    Run {
        command: String,
        run: BoxFuture<'static, HandlerResult>,
        guard: RunningGuard,
    },
}

/// Handle given to command handlers
///
/// It can write to the transcript and observe the halt flag, nothing else.
#[derive(Clone)]
pub struct ExecutionContext {
    shared: Arc<Shared>,
}

impl ExecutionContext {
    /// Append a plain-text output line
    pub fn append_output(&self, text: impl Into<String>) {
        self.shared.append(TerminalMessage::output(text));
    }

    /// Append an output line containing markup
    pub fn append_html(&self, text: impl Into<String>) {
        self.shared.append(TerminalMessage::html(text));
    }

    pub fn append(&self, text: impl Into<String>, is_html: bool) {
        if is_html {
            self.append_html(text);
        } else {
            self.append_output(text);
        }
    }

    pub fn clear_messages(&self) {
        self.shared.clear();
    }

    /// Whether the user asked the running command to stop
    ///
    /// Long-running handlers should poll this and return early.
    pub fn is_halted(&self) -> bool {
        self.shared.halted.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("is_halted", &self.is_halted())
            .finish()
    }
}

/// A terminal session
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct TerminalSession {
    shared: Arc<Shared>,
}

impl TerminalSession {
    pub fn new(commands: Vec<CommandDefinition>, options: SessionOptions) -> Self {
        let vocabulary = Vocabulary::from_commands(&commands);
        let state = SessionState {
            input: String::new(),
            history: CommandHistory::with_limit(options.history_limit),
            messages: Vec::new(),
            commands,
            vocabulary,
            running: false,
            pending: VecDeque::new(),
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                dispatching: Mutex::new(()),
                halted: AtomicBool::new(false),
                options,
            }),
        }
    }

    // --- Command set ---

    /// Replace the command set and rebuild the suggestion vocabulary
    pub fn set_commands(&self, commands: Vec<CommandDefinition>) {
        let mut state = self.shared.lock();
        state.vocabulary = Vocabulary::from_commands(&commands);
        state.commands = commands;
        debug!(candidates = state.vocabulary.len(), "command set replaced");
    }

    /// Add one command after the existing ones
    pub fn register_command(&self, command: CommandDefinition) {
        let mut state = self.shared.lock();
        state.commands.push(command);
        state.vocabulary = Vocabulary::from_commands(&state.commands);
    }

    pub fn commands(&self) -> Vec<CommandDefinition> {
        self.shared.lock().commands.clone()
    }

    // --- Read-only views ---

    pub fn input(&self) -> String {
        self.shared.lock().input.clone()
    }

    /// Completion for the current input, or `""`
    pub fn suggestion(&self) -> String {
        let state = self.shared.lock();
        state.vocabulary.suggest(&state.input).to_string()
    }

    pub fn messages(&self) -> Vec<TerminalMessage> {
        self.shared.lock().messages.clone()
    }

    /// Submitted lines, newest first
    pub fn history(&self) -> Vec<String> {
        self.shared.lock().history.entries()
    }

    /// Entry shown by history browsing, `None` when editing a fresh line
    pub fn history_index(&self) -> Option<usize> {
        self.shared.lock().history.cursor().index()
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn is_halted(&self) -> bool {
        self.shared.halted.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.lock();
        SessionSnapshot {
            input: state.input.clone(),
            suggestion: state.vocabulary.suggest(&state.input).to_string(),
            messages: state.messages.clone(),
            history: state.history.entries(),
            history_index: state.history.cursor().index(),
            is_running: state.running,
        }
    }

    // --- Input editing ---

    pub fn set_input(&self, text: impl Into<String>) {
        self.shared.lock().input = text.into();
    }

    /// Replace the input with the current suggestion, if any
    pub fn autocomplete_suggestion(&self) {
        let mut state = self.shared.lock();
        let suggestion = state.vocabulary.suggest(&state.input).to_string();
        if !suggestion.is_empty() {
            state.input = suggestion;
        }
    }

    /// Show the next older history entry. Returns false if nothing changed.
    pub fn navigate_to_previous_entry(&self) -> bool {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        match state.history.previous() {
            Some(text) => {
                state.input = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Show the next newer history entry, or an empty line past the newest.
    /// Returns false if nothing changed.
    pub fn navigate_to_next_entry(&self) -> bool {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        match state.history.next() {
            Some(text) => {
                state.input = text.to_string();
                true
            }
            None => false,
        }
    }

    // --- Execution ---

    /// Submit the current input
    ///
    /// Everything up to handler dispatch happens before this returns: the
    /// input is echoed and cleared, history is updated and the session is
    /// marked running. The returned future drives the handler. Dropping it
    /// abandons the handler and releases the session.
    pub fn execute(&self) -> impl Future<Output = Result<ExecOutcome>> + Send + 'static {
        let dispatch = self.begin_execution();
        async move {
            match dispatch {
                Dispatch::Done(outcome) => Ok(outcome),
                Dispatch::Run {
                    command,
                    run,
                    guard,
                } => {
                    let result = run.await;
                    drop(guard);
                    match result {
                        Ok(()) => {
                            info!(command = %command, "command finished");
                            Ok(ExecOutcome::Completed { command })
                        }
                        Err(source) => {
                            warn!(command = %command, error = %source, "command failed");
                            Err(SessionError::Handler { command, source })
                        }
                    }
                }
            }
        }
    }

    fn begin_execution(&self) -> Dispatch {
        let found = {
            let mut state = self.shared.lock();
            if state.running {
                debug!("execute ignored: a command is already running");
                return Dispatch::Done(ExecOutcome::Busy);
            }

            let line = state.input.trim().to_string();
            state.input.clear();
            state.push(TerminalMessage::input(line.clone()));

            match parse_line(&line) {
                None => Err(ExecOutcome::Blank),
                Some(parsed) => {
                    state.history.add(&line);
                    let definition = state
                        .commands
                        .iter()
                        .find(|c| c.name == parsed.command)
                        .cloned();
                    match definition {
                        Some(definition) => {
                            state.running = true;
                            self.shared.halted.store(false, Ordering::SeqCst);
                            // Held from here on so hooks or a panicking
                            // synchronous handler cannot leave the session busy
                            let guard = RunningGuard {
                                shared: Arc::clone(&self.shared),
                            };
                            Ok((definition, parsed.args, guard))
                        }
                        None => {
                            state.push(TerminalMessage::output(format!(
                                "sh: command not found: {}",
                                parsed.command
                            )));
                            Err(ExecOutcome::NotFound {
                                command: parsed.command,
                            })
                        }
                    }
                }
            }
        };
        self.shared.flush();

        match found {
            Err(outcome) => {
                debug!(?outcome, "nothing to run");
                Dispatch::Done(outcome)
            }
            Ok((definition, args, guard)) => {
                info!(command = %definition.name, args = ?args, "running command");
                let ctx = ExecutionContext {
                    shared: Arc::clone(&self.shared),
                };
                let run = definition.invoke(args, ctx);
                Dispatch::Run {
                    command: definition.name,
                    run,
                    guard,
                }
            }
        }
    }

    /// Ask the running command to stop
    ///
    /// At an idle prompt this records an empty prompt line instead, like
    /// pressing Ctrl+C in a real shell.
    pub fn halt_execution(&self) {
        {
            let mut state = self.shared.lock();
            self.shared.halted.store(true, Ordering::SeqCst);
            if state.running {
                debug!("halt requested for running command");
            } else {
                state.push(TerminalMessage::input(""));
            }
        }
        self.shared.flush();
    }
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("TerminalSession")
            .field("input", &state.input)
            .field("messages", &state.messages.len())
            .field("history", &state.history.len())
            .field("running", &state.running)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::MessageKind;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::AtomicUsize;
    use std::sync::OnceLock;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn noop(name: &str) -> CommandDefinition {
        CommandDefinition::new_sync(name, "", |_, _| Ok(()))
    }

    fn counting(name: &str, counter: Arc<AtomicUsize>) -> CommandDefinition {
        CommandDefinition::new_sync(name, "", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    /// Handler that stays in flight until `release` is notified
    fn blocking(name: &str, release: Arc<Notify>) -> CommandDefinition {
        CommandDefinition::new(name, "", move |_, _| {
            let release = Arc::clone(&release);
            async move {
                release.notified().await;
                Ok(())
            }
        })
    }

    fn session(commands: Vec<CommandDefinition>) -> TerminalSession {
        TerminalSession::new(commands, SessionOptions::default())
    }

    async fn submit(session: &TerminalSession, line: &str) -> Result<ExecOutcome> {
        session.set_input(line);
        session.execute().await
    }

    #[tokio::test]
    async fn test_dispatches_only_matching_command() {
        let abc = Arc::new(AtomicUsize::new(0));
        let dfg = Arc::new(AtomicUsize::new(0));
        let session = session(vec![
            counting("abc", Arc::clone(&abc)),
            counting("dfg", Arc::clone(&dfg)),
        ]);

        let outcome = submit(&session, "abc").await.unwrap();
        assert_eq!(
            outcome,
            ExecOutcome::Completed {
                command: "abc".into()
            }
        );
        assert_eq!(abc.load(Ordering::SeqCst), 1);
        assert_eq!(dfg.load(Ordering::SeqCst), 0);
        assert_eq!(session.messages(), vec![TerminalMessage::input("abc")]);
        assert_eq!(session.input(), "");
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let session = session(vec![noop("abc")]);
        let outcome = submit(&session, "zzz --flag").await.unwrap();
        assert_eq!(
            outcome,
            ExecOutcome::NotFound {
                command: "zzz".into()
            }
        );

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], TerminalMessage::input("zzz --flag"));
        assert_eq!(
            messages[1],
            TerminalMessage::output("sh: command not found: zzz")
        );
        assert!(!session.is_running());
        assert_eq!(session.history(), vec!["zzz --flag"]);
    }

    #[tokio::test]
    async fn test_unknown_command_never_marks_running() {
        let handle: Arc<OnceLock<TerminalSession>> = Arc::new(OnceLock::new());
        let observed = Arc::new(Mutex::new(Vec::new()));
        let hook_handle = Arc::clone(&handle);
        let sink = Arc::clone(&observed);
        let options = SessionOptions::new().on_transcript_changed(move |_| {
            if let Some(session) = hook_handle.get() {
                sink.lock().unwrap().push(session.is_running());
            }
        });
        let session = TerminalSession::new(vec![noop("abc")], options);
        handle.set(session.clone()).unwrap();

        submit(&session, "zzz").await.unwrap();
        // Both the echoed line and the not-found line saw an idle session
        assert_eq!(*observed.lock().unwrap(), vec![false, false]);
    }

    #[tokio::test]
    async fn test_handler_output_follows_input() {
        let session = session(vec![CommandDefinition::new_sync("abc", "", |_, ctx| {
            ctx.append_output("hello world");
            Ok(())
        })]);
        submit(&session, "abc").await.unwrap();

        let messages = session.messages();
        assert_eq!(
            messages,
            vec![
                TerminalMessage {
                    kind: MessageKind::Input,
                    text: "abc".into(),
                    is_html: false
                },
                TerminalMessage {
                    kind: MessageKind::Output,
                    text: "hello world".into(),
                    is_html: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_handler_receives_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let session = session(vec![CommandDefinition::new_sync("echo", "", move |args, _| {
            sink.lock().unwrap().extend_from_slice(args);
            Ok(())
        })]);
        submit(&session, "  echo  hello   there ").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["hello", "there"]);
        assert_eq!(session.messages()[0].text, "echo  hello   there");
    }

    #[tokio::test]
    async fn test_blank_input_is_echoed_only() {
        let session = session(vec![noop("abc")]);
        let outcome = submit(&session, "   ").await.unwrap();
        assert_eq!(outcome, ExecOutcome::Blank);
        assert_eq!(session.messages(), vec![TerminalMessage::input("")]);
        assert!(session.history().is_empty());
        assert_eq!(session.input(), "");
    }

    #[tokio::test]
    async fn test_duplicate_names_resolve_to_first() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let session = session(vec![
            counting("abc", Arc::clone(&first)),
            counting("abc", Arc::clone(&second)),
        ]);
        submit(&session, "abc").await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_while_running_is_dropped() {
        let release = Arc::new(Notify::new());
        let session = session(vec![blocking("wait", Arc::clone(&release)), noop("abc")]);

        session.set_input("wait");
        let first = tokio::spawn(session.execute());
        assert!(session.is_running());

        session.set_input("abc");
        let outcome = session.execute().await.unwrap();
        assert_eq!(outcome, ExecOutcome::Busy);
        // The dropped submission leaves input and transcript untouched
        assert_eq!(session.input(), "abc");
        assert_eq!(session.messages(), vec![TerminalMessage::input("wait")]);

        release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            ExecOutcome::Completed {
                command: "wait".into()
            }
        );
        assert!(!session.is_running());

        let outcome = session.execute().await.unwrap();
        assert_eq!(
            outcome,
            ExecOutcome::Completed {
                command: "abc".into()
            }
        );
    }

    #[tokio::test]
    async fn test_halt_while_running_is_cooperative() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let session = session(vec![CommandDefinition::new("spin", "", move |_, ctx| {
            let counter = Arc::clone(&counter);
            async move {
                while !ctx.is_halted() {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                ctx.append_output("stopped");
                Ok(())
            }
        })]);

        session.set_input("spin");
        let run = tokio::spawn(session.execute());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(session.is_running());

        session.halt_execution();
        assert!(session.is_halted());
        run.await.unwrap().unwrap();

        assert!(!session.is_running());
        assert!(ticks.load(Ordering::SeqCst) > 0);
        // No blank prompt line when halting a running command
        assert_eq!(
            session.messages(),
            vec![
                TerminalMessage::input("spin"),
                TerminalMessage::output("stopped")
            ]
        );
    }

    #[tokio::test]
    async fn test_halt_flag_resets_on_next_execution() {
        let observed = Arc::new(AtomicBool::new(true));
        let sink = Arc::clone(&observed);
        let session = session(vec![CommandDefinition::new_sync("abc", "", move |_, ctx| {
            sink.store(ctx.is_halted(), Ordering::SeqCst);
            Ok(())
        })]);

        session.halt_execution();
        assert!(session.is_halted());
        submit(&session, "abc").await.unwrap();
        assert!(!observed.load(Ordering::SeqCst));
        assert!(!session.is_halted());
    }

    #[test]
    fn test_halt_when_idle_appends_blank_prompt() {
        let session = session(vec![]);
        session.halt_execution();
        session.halt_execution();
        assert_eq!(
            session.messages(),
            vec![TerminalMessage::input(""), TerminalMessage::input("")]
        );
    }

    #[tokio::test]
    async fn test_failing_handler_releases_session() {
        let session = session(vec![CommandDefinition::new("boom", "", |_, ctx| async move {
            ctx.append_output("about to fail");
            Err(anyhow::anyhow!("disk on fire"))
        })]);

        let err = submit(&session, "boom").await.unwrap_err();
        match &err {
            SessionError::Handler { command, source } => {
                assert_eq!(command, "boom");
                assert_eq!(source.to_string(), "disk on fire");
            }
        }
        assert!(err.to_string().contains("disk on fire"));
        assert!(!session.is_running());
        // The engine adds no error text of its own
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_panicking_handler_releases_session() {
        let session = session(vec![CommandDefinition::new("boom", "", |_, _| async {
            let exploded = true;
            if exploded {
                panic!("handler exploded");
            }
            Ok(())
        })]);

        session.set_input("boom");
        let joined = tokio::spawn(session.execute()).await;
        assert!(joined.unwrap_err().is_panic());
        assert!(!session.is_running());
    }

    #[test]
    fn test_panicking_sync_handler_releases_session() {
        let session = session(vec![CommandDefinition::new_sync("boom", "", |_, _| {
            panic!("handler exploded")
        })]);

        session.set_input("boom");
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = session.execute();
        }));
        assert!(result.is_err());
        assert!(!session.is_running());
    }

    #[test]
    fn test_dropping_execution_releases_session() {
        let release = Arc::new(Notify::new());
        let session = session(vec![blocking("wait", release)]);

        session.set_input("wait");
        let pending = session.execute();
        assert!(session.is_running());
        drop(pending);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_context_clear_and_html() {
        let session = session(vec![
            CommandDefinition::new_sync("clear", "", |_, ctx| {
                ctx.clear_messages();
                Ok(())
            }),
            CommandDefinition::new_sync("banner", "", |_, ctx| {
                ctx.append("<b>hi</b>", true);
                ctx.append("plain", false);
                Ok(())
            }),
        ]);

        submit(&session, "banner").await.unwrap();
        let messages = session.messages();
        assert!(messages[1].is_html);
        assert!(!messages[2].is_html);

        submit(&session, "clear").await.unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(session.history(), vec!["clear", "banner"]);
    }

    #[tokio::test]
    async fn test_hooks_fire_per_mutation() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let outputs = Arc::new(Mutex::new(Vec::new()));
        let change_sink = Arc::clone(&changes);
        let output_sink = Arc::clone(&outputs);
        let options = SessionOptions::new()
            .on_transcript_changed(move |change| change_sink.lock().unwrap().push(change.clone()))
            .on_output_appended(move |message| {
                output_sink.lock().unwrap().push(message.text.clone())
            });
        let session = TerminalSession::new(
            vec![CommandDefinition::new_sync("abc", "", |_, ctx| {
                ctx.append_output("one");
                ctx.clear_messages();
                ctx.append_output("two");
                Ok(())
            })],
            options,
        );

        submit(&session, "abc").await.unwrap();
        submit(&session, "nope").await.unwrap();

        assert_eq!(
            *changes.lock().unwrap(),
            vec![
                TranscriptChange::Appended(TerminalMessage::input("abc")),
                TranscriptChange::Appended(TerminalMessage::output("one")),
                TranscriptChange::Cleared,
                TranscriptChange::Appended(TerminalMessage::output("two")),
                TranscriptChange::Appended(TerminalMessage::input("nope")),
                TranscriptChange::Appended(TerminalMessage::output(
                    "sh: command not found: nope"
                )),
            ]
        );
        assert_eq!(
            *outputs.lock().unwrap(),
            vec!["one", "two", "sh: command not found: nope"]
        );
    }

    #[test]
    fn test_concurrent_appends_reach_hooks_in_transcript_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = SessionOptions::new().on_transcript_changed(move |change| {
            if let TranscriptChange::Appended(message) = change {
                sink.lock().unwrap().push(message.text.clone());
            }
        });
        let session = TerminalSession::new(vec![], options);
        let ctx = ExecutionContext {
            shared: Arc::clone(&session.shared),
        };

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for line in 0..500 {
                        ctx.append_output(format!("{}:{}", writer, line));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let transcript: Vec<String> = session.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(transcript.len(), 2000);
        assert_eq!(*seen.lock().unwrap(), transcript);
    }

    #[test]
    fn test_hook_may_append_without_deadlock() {
        let handle: Arc<OnceLock<TerminalSession>> = Arc::new(OnceLock::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook_handle = Arc::clone(&handle);
        let sink = Arc::clone(&seen);
        let options = SessionOptions::new().on_output_appended(move |message| {
            sink.lock().unwrap().push(message.text.clone());
            if message.text == "first" {
                if let Some(session) = hook_handle.get() {
                    ExecutionContext {
                        shared: Arc::clone(&session.shared),
                    }
                    .append_output("second");
                }
            }
        });
        let session = TerminalSession::new(vec![], options);
        handle.set(session.clone()).unwrap();

        let ctx = ExecutionContext {
            shared: Arc::clone(&session.shared),
        };
        ctx.append_output("first");
        ctx.append_output("third");

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
        let transcript: Vec<String> = session.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(transcript, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_suggestion_and_autocomplete() {
        let session = session(vec![
            noop("help"),
            noop("theme").with_arguments(["nord", "dracula"]),
        ]);
        assert_eq!(session.suggestion(), "");

        session.set_input("th");
        assert_eq!(session.suggestion(), "theme");
        session.set_input("theme d");
        assert_eq!(session.suggestion(), "theme dracula");

        session.autocomplete_suggestion();
        assert_eq!(session.input(), "theme dracula");
        session.autocomplete_suggestion();
        assert_eq!(session.input(), "theme dracula");

        session.set_input("zzz");
        session.autocomplete_suggestion();
        assert_eq!(session.input(), "zzz");
    }

    #[test]
    fn test_register_command_extends_vocabulary() {
        let session = session(vec![noop("help")]);
        session.set_input("ec");
        assert_eq!(session.suggestion(), "");

        session.register_command(noop("echo"));
        assert_eq!(session.suggestion(), "echo");

        session.set_commands(vec![noop("ecology")]);
        assert_eq!(session.suggestion(), "ecology");
        assert_eq!(session.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_history_navigation_round_trip() {
        let session = session(vec![noop("abc")]);
        submit(&session, "abc a").await.unwrap();
        submit(&session, "abc b").await.unwrap();

        assert!(session.navigate_to_previous_entry());
        assert_eq!(session.input(), "abc b");
        assert!(session.navigate_to_previous_entry());
        assert_eq!(session.input(), "abc a");
        assert!(!session.navigate_to_previous_entry());
        assert_eq!(session.input(), "abc a");
        assert_eq!(session.history_index(), Some(1));

        assert!(session.navigate_to_next_entry());
        assert_eq!(session.input(), "abc b");
        assert!(session.navigate_to_next_entry());
        assert_eq!(session.input(), "");
        assert!(!session.navigate_to_next_entry());
        assert_eq!(session.history_index(), None);
    }

    #[tokio::test]
    async fn test_repeated_submission_keeps_one_entry() {
        let session = session(vec![noop("x")]);
        submit(&session, "x").await.unwrap();
        submit(&session, "x").await.unwrap();
        assert_eq!(session.history(), vec!["x"]);
    }

    #[tokio::test]
    async fn test_submission_resets_browsing() {
        let session = session(vec![noop("a"), noop("b")]);
        submit(&session, "a").await.unwrap();
        submit(&session, "b").await.unwrap();

        session.navigate_to_previous_entry();
        session.navigate_to_previous_entry();
        assert_eq!(session.history_index(), Some(1));

        // Re-running a browsed entry stops browsing
        session.execute().await.unwrap();
        assert_eq!(session.history_index(), None);
        assert_eq!(session.history(), vec!["a", "b", "a"]);

        session.navigate_to_previous_entry();
        session.set_input("b");
        session.execute().await.unwrap();
        assert_eq!(session.history_index(), None);
    }

    #[test]
    fn test_navigation_overwrites_manual_edit() {
        let session = session(vec![]);
        session.set_input("draft");
        assert!(!session.navigate_to_previous_entry());
        assert_eq!(session.input(), "draft");
        assert!(!session.navigate_to_next_entry());
        assert_eq!(session.input(), "draft");
    }

    #[tokio::test]
    async fn test_history_limit_option() {
        let session = TerminalSession::new(
            vec![noop("a"), noop("b"), noop("c")],
            SessionOptions::new().history_limit(Some(2)),
        );
        for line in ["a", "b", "c"] {
            submit(&session, line).await.unwrap();
        }
        assert_eq!(session.history(), vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let release = Arc::new(Notify::new());
        let session = session(vec![blocking("wait", Arc::clone(&release))]);
        session.set_input("wait");
        let run = tokio::spawn(session.execute());

        session.set_input("wa");
        let snapshot = session.snapshot();
        assert_eq!(snapshot.input, "wa");
        assert_eq!(snapshot.suggestion, "wait");
        assert_eq!(snapshot.history, vec!["wait"]);
        assert_eq!(snapshot.history_index, None);
        assert!(snapshot.is_running);
        assert_eq!(snapshot.messages, vec![TerminalMessage::input("wait")]);

        release.notify_one();
        run.await.unwrap().unwrap();
        assert!(!session.snapshot().is_running);
    }
}
