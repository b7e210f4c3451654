//! shellfolio - a portfolio that behaves like a shell
//!
//! Runs the terminal session engine in a raw-mode terminal with a small set
//! of built-in commands.
//!
//! # Quick Start
//!
//! ```text
//! shellfolio               # Start with ~/.shellfolio/config.toml
//! shellfolio -t nord       # Override the color scheme
//! shellfolio -c site.toml  # Use another config file
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | Tab / Right | Accept suggestion |
//! | Up / Down | Browse history |
//! | Enter | Run command |
//! | Ctrl+C | Interrupt |
//! | Ctrl+U | Clear line |
//! | Ctrl+L | Clear screen |
//! | Ctrl+D / Esc | Quit |

mod commands;
mod ui;

use std::env;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use tokio::runtime::Runtime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shellfolio::config::{self, ColorScheme, Config as SiteConfig};
use shellfolio::core::{SessionOptions, TerminalSession, TranscriptChange};

use crate::commands::SharedScheme;
use crate::ui::{Action, KeyMapper, Renderer};

/// Command line options
#[derive(Debug, Default)]
struct Options {
    /// Color scheme override
    theme: Option<String>,
    /// Config file override
    config_path: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Input poll interval; also bounds how late handler output is drawn
const FRAME: Duration = Duration::from_millis(30);

fn print_version() {
    eprintln!("shellfolio {}", VERSION);
}

fn print_help() {
    eprintln!("shellfolio {} - a portfolio that behaves like a shell", VERSION);
    eprintln!();
    eprintln!("Usage: shellfolio [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -t, --theme <NAME>    Color scheme ({})", ColorScheme::list().join(", "));
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.shellfolio/config.toml)");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  Tab, Right            Accept suggestion");
    eprintln!("  Up, Down              Browse history");
    eprintln!("  Ctrl+C                Interrupt running command");
    eprintln!("  Ctrl+U                Clear line");
    eprintln!("  Ctrl+L                Clear screen");
    eprintln!("  Ctrl+D, Esc           Quit");
    eprintln!();
    eprintln!("Log file: ~/.shellfolio/shellfolio.log (level via SHELLFOLIO_LOG)");
}

fn parse_args<I>(args: I) -> Result<Options, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-t" | "--theme" => {
                let name = args.next().ok_or("Missing theme argument")?;
                if ColorScheme::find(&name).is_none() {
                    return Err(format!("Unknown theme: {}", name));
                }
                options.theme = Some(name);
            }
            "-c" | "--config" => {
                let path = args.next().ok_or("Missing config path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            other => {
                return Err(format!("Unknown argument: {}. Use -h for help.", other));
            }
        }
    }

    Ok(options)
}

/// Log to ~/.shellfolio/shellfolio.log; stdout belongs to the prompt
fn init_logging() {
    let log_path = config::data_dir()
        .map(|dir| dir.join("shellfolio.log"))
        .unwrap_or_else(|| PathBuf::from("shellfolio.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("SHELLFOLIO_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args(env::args().skip(1)) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("shellfolio {} starting...", VERSION);

    let mut site = match &options.config_path {
        Some(path) => SiteConfig::load_or_default(path),
        None => SiteConfig::load(),
    };
    if let Some(theme) = options.theme {
        site.color_scheme = theme;
    }

    run_shell(site)
}

fn run_shell(site: SiteConfig) -> anyhow::Result<()> {
    let runtime = Runtime::new()?;
    let scheme: SharedScheme = Arc::new(RwLock::new(site.get_color_scheme()));

    let (change_tx, change_rx) = mpsc::channel::<TranscriptChange>();
    let change_tx = std::sync::Mutex::new(change_tx);
    let session_options = SessionOptions::new()
        .history_limit(site.history_limit)
        .on_transcript_changed(move |change| {
            if let Ok(tx) = change_tx.lock() {
                let _ = tx.send(change.clone());
            }
        });
    let session = TerminalSession::new(
        commands::builtin(&site.files, Arc::clone(&scheme)),
        session_options,
    );
    info!(commands = session.commands().len(), "session ready");

    let mut renderer = Renderer::stdout(site.prompt.as_str());
    renderer.init()?;

    let current = current_scheme(&scheme);
    for line in &site.motd {
        renderer.print_notice(line, &current)?;
    }

    let (fault_tx, fault_rx) = mpsc::channel::<String>();
    let result = run_main_loop(
        &runtime,
        &session,
        &mut renderer,
        &scheme,
        &change_rx,
        &fault_tx,
        &fault_rx,
    );

    renderer.cleanup()?;
    // Handlers still running after this are abandoned
    runtime.shutdown_timeout(Duration::from_millis(200));
    info!("shellfolio exiting");
    result
}

fn current_scheme(scheme: &SharedScheme) -> ColorScheme {
    scheme.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn run_main_loop(
    runtime: &Runtime,
    session: &TerminalSession,
    renderer: &mut Renderer<std::io::Stdout>,
    scheme: &SharedScheme,
    changes: &Receiver<TranscriptChange>,
    fault_tx: &Sender<String>,
    faults: &Receiver<String>,
) -> anyhow::Result<()> {
    let mut dirty = true;

    loop {
        let current = current_scheme(scheme);

        while let Ok(change) = changes.try_recv() {
            renderer.apply(&change, &current)?;
            dirty = true;
        }
        while let Ok(fault) = faults.try_recv() {
            renderer.print_notice(&fault, &current)?;
            dirty = true;
        }
        if dirty {
            renderer.draw_prompt(&session.input(), &session.suggestion(), &current)?;
            dirty = false;
        }

        if !event::poll(FRAME)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let mut input = session.input();
        let Some(action) = KeyMapper::map(&key, input.is_empty()) else {
            continue;
        };
        match action {
            Action::Insert(ch) => {
                input.push(ch);
                session.set_input(input);
            }
            Action::Backspace => {
                input.pop();
                session.set_input(input);
            }
            Action::ClearLine => session.set_input(""),
            Action::Autocomplete => session.autocomplete_suggestion(),
            Action::HistoryPrevious => {
                session.navigate_to_previous_entry();
            }
            Action::HistoryNext => {
                session.navigate_to_next_entry();
            }
            Action::Submit => {
                let run = session.execute();
                let fault_tx = fault_tx.clone();
                runtime.spawn(async move {
                    if let Err(e) = run.await {
                        error!("{}", e);
                        let _ = fault_tx.send(e.to_string());
                    }
                });
            }
            Action::Halt => session.halt_execution(),
            Action::ClearScreen => renderer.clear_screen()?,
            Action::Quit => break,
        }
        dirty = true;
    }

    Ok(())
}
