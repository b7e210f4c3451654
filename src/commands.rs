//! Built-in portfolio commands
//!
//! These are ordinary registered commands; the session engine knows nothing
//! about them.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use shellfolio::config::ColorScheme;
use shellfolio::core::{CommandDefinition, ExecutionContext};

/// Shared, switchable color scheme
pub type SharedScheme = Arc<RwLock<ColorScheme>>;

const COUNTDOWN_DEFAULT: u64 = 10;
const HALT_POLL: Duration = Duration::from_millis(100);
const POLLS_PER_TICK: u32 = 10;

/// Build the built-in command set
pub fn builtin(files: &BTreeMap<String, String>, scheme: SharedScheme) -> Vec<CommandDefinition> {
    let mut commands = vec![
        echo(),
        ls(files.clone()),
        cat(files.clone()),
        theme(scheme),
        clear(),
        countdown(),
    ];

    let mut listing: Vec<(String, String)> = commands
        .iter()
        .map(|c| (c.name.clone(), c.description.clone()))
        .collect();
    listing.insert(0, ("help".to_string(), HELP_DESCRIPTION.to_string()));
    commands.insert(0, help(listing));
    commands
}

const HELP_DESCRIPTION: &str = "List available commands";

fn help(listing: Vec<(String, String)>) -> CommandDefinition {
    let width = listing.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    CommandDefinition::new_sync("help", HELP_DESCRIPTION, move |_, ctx| {
        for (name, description) in &listing {
            let pad = "&nbsp;".repeat(width - name.len() + 2);
            ctx.append_html(format!("<b>{}</b>{}{}", name, pad, escape_html(description)));
        }
        Ok(())
    })
}

fn echo() -> CommandDefinition {
    CommandDefinition::new_sync("echo", "Print the arguments", |args, ctx| {
        ctx.append_output(args.join(" "));
        Ok(())
    })
}

fn ls(files: BTreeMap<String, String>) -> CommandDefinition {
    CommandDefinition::new_sync("ls", "List files", move |_, ctx| {
        let names: Vec<&str> = files.keys().map(String::as_str).collect();
        ctx.append_output(names.join("  "));
        Ok(())
    })
}

fn cat(files: BTreeMap<String, String>) -> CommandDefinition {
    let names: Vec<String> = files.keys().cloned().collect();
    CommandDefinition::new_sync("cat", "Show a file", move |args, ctx| {
        if args.is_empty() {
            ctx.append_output("usage: cat <file>...");
            return Ok(());
        }
        for name in args {
            match files.get(name) {
                Some(contents) => ctx.append_output(contents.as_str()),
                None => ctx.append_output(format!("cat: {}: No such file or directory", name)),
            }
        }
        Ok(())
    })
    .with_arguments(names)
}

fn theme(scheme: SharedScheme) -> CommandDefinition {
    CommandDefinition::new_sync("theme", "Switch the color scheme", move |args, ctx| {
        let Some(name) = args.first() else {
            let current = scheme.read().unwrap_or_else(PoisonError::into_inner).name.clone();
            ctx.append_output(format!("current theme: {}", current));
            ctx.append_output(format!("available: {}", ColorScheme::list().join(", ")));
            return Ok(());
        };
        match ColorScheme::find(name) {
            Some(found) => {
                ctx.append_output(format!("theme set to {}", found.name));
                *scheme.write().unwrap_or_else(PoisonError::into_inner) = found;
            }
            None => ctx.append_output(format!("theme: unknown theme '{}'", name)),
        }
        Ok(())
    })
    .with_arguments(ColorScheme::list())
}

fn clear() -> CommandDefinition {
    CommandDefinition::new_sync("clear", "Clear the screen", |_, ctx| {
        ctx.clear_messages();
        Ok(())
    })
}

fn countdown() -> CommandDefinition {
    CommandDefinition::new("countdown", "Count down from n (Ctrl+C stops)", |args, ctx| async move {
        let from = match args.first().map(|arg| (arg, arg.parse::<u64>())) {
            Some((_, Ok(n))) => n,
            Some((arg, Err(e))) => {
                return Err(anyhow::anyhow!("countdown: invalid number '{}': {}", arg, e));
            }
            None => COUNTDOWN_DEFAULT,
        };
        run_countdown(from, &ctx, HALT_POLL).await;
        Ok(())
    })
}

async fn run_countdown(from: u64, ctx: &ExecutionContext, poll: Duration) {
    for n in (1..=from).rev() {
        ctx.append_output(format!("{}...", n));
        for _ in 0..POLLS_PER_TICK {
            if ctx.is_halted() {
                ctx.append_output("^C");
                return;
            }
            tokio::time::sleep(poll).await;
        }
    }
    ctx.append_output("liftoff!");
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
