//! Line renderer using crossterm
//!
//! Prints transcript messages as they arrive and keeps a single prompt line
//! at the bottom. Output scrolls naturally; there is no alternate screen.

use std::io::{self, Write};

use crossterm::{
    cursor::{MoveTo, MoveToColumn},
    queue,
    style::{Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use unicode_width::UnicodeWidthStr;

use shellfolio::config::ColorScheme;
use shellfolio::core::{MessageKind, TerminalMessage, TranscriptChange};

const NOT_FOUND_PREFIX: &str = "sh: command not found:";

/// Terminal renderer
pub struct Renderer<W: Write> {
    out: W,
    prompt: String,
    /// Whether raw mode was enabled by us
    raw: bool,
}

impl Renderer<io::Stdout> {
    pub fn stdout(prompt: impl Into<String>) -> Self {
        Self::new(io::stdout(), prompt)
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, prompt: impl Into<String>) -> Self {
        Self {
            out,
            prompt: prompt.into(),
            raw: false,
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    /// Restore the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.raw {
            queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine), ResetColor)?;
            self.out.flush()?;
            terminal::disable_raw_mode()?;
            self.raw = false;
        }
        Ok(())
    }

    /// Print a line above the prompt, outside the transcript
    pub fn print_notice(&mut self, text: &str, scheme: &ColorScheme) -> io::Result<()> {
        self.clear_prompt_line()?;
        self.print_lines(text, scheme.output.to_crossterm())
    }

    /// Apply one transcript change to the screen
    pub fn apply(&mut self, change: &TranscriptChange, scheme: &ColorScheme) -> io::Result<()> {
        match change {
            TranscriptChange::Appended(message) => self.print_message(message, scheme),
            TranscriptChange::Cleared => self.clear_screen(),
        }
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    fn print_message(&mut self, message: &TerminalMessage, scheme: &ColorScheme) -> io::Result<()> {
        self.clear_prompt_line()?;
        match message.kind {
            MessageKind::Input => {
                queue!(
                    self.out,
                    SetForegroundColor(scheme.prompt.to_crossterm()),
                    Print(&self.prompt),
                    SetForegroundColor(scheme.input.to_crossterm()),
                    Print(&message.text),
                    ResetColor,
                    Print("\r\n"),
                )
            }
            MessageKind::Output => {
                let text = if message.is_html {
                    strip_html(&message.text)
                } else {
                    message.text.clone()
                };
                let color = if text.starts_with(NOT_FOUND_PREFIX) {
                    scheme.error
                } else {
                    scheme.output
                };
                self.print_lines(&text, color.to_crossterm())
            }
        }
    }

    fn print_lines(&mut self, text: &str, color: crossterm::style::Color) -> io::Result<()> {
        queue!(self.out, SetForegroundColor(color))?;
        for line in text.split('\n') {
            queue!(self.out, Print(line.trim_end_matches('\r')), Print("\r\n"))?;
        }
        queue!(self.out, ResetColor)
    }

    fn clear_prompt_line(&mut self) -> io::Result<()> {
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))
    }

    /// Redraw the prompt line with the input and the dimmed suggestion tail
    pub fn draw_prompt(
        &mut self,
        input: &str,
        suggestion: &str,
        scheme: &ColorScheme,
    ) -> io::Result<()> {
        self.clear_prompt_line()?;
        queue!(
            self.out,
            SetForegroundColor(scheme.prompt.to_crossterm()),
            Print(&self.prompt),
            SetForegroundColor(scheme.input.to_crossterm()),
            Print(input),
            SetForegroundColor(scheme.suggestion.to_crossterm()),
            Print(suggestion_tail(input, suggestion)),
            ResetColor,
        )?;
        let column = cursor_column(&self.prompt, input);
        queue!(self.out, MoveToColumn(column))?;
        self.out.flush()
    }
}

impl<W: Write> Drop for Renderer<W> {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// The part of the suggestion not yet typed
///
/// Leading blanks are ignored the same way autocomplete ignores them, so
/// `"  he"` against `"help"` yields `"lp"`.
pub fn suggestion_tail<'a>(input: &str, suggestion: &'a str) -> &'a str {
    let typed = input.trim_start();
    if typed.is_empty() {
        return "";
    }
    suggestion.strip_prefix(typed).unwrap_or("")
}

/// Display column just after the input
pub fn cursor_column(prompt: &str, input: &str) -> u16 {
    let width = prompt.width() + input.width();
    u16::try_from(width).unwrap_or(u16::MAX)
}

/// Reduce markup to plain text for a character terminal
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => {
                let tag = rest[open + 1..open + close].trim().to_ascii_lowercase();
                if tag == "br" || tag == "br/" || tag == "br /" {
                    text.push('\n');
                }
                rest = &rest[open + close + 1..];
            }
            None => {
                // Unterminated tag, keep it as text
                text.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    text.push_str(rest);

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
