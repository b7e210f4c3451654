//! Key mapping for the prompt
//!
//! Converts key events to session actions.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// What a key press asks the session to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Insert(char),
    Backspace,
    ClearLine,
    Autocomplete,
    HistoryPrevious,
    HistoryNext,
    Submit,
    Halt,
    ClearScreen,
    Quit,
}

/// Key mapper for converting key events to actions
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent to a prompt action
    ///
    /// `input_empty` decides whether Ctrl+D quits.
    pub fn map(event: &KeyEvent, input_empty: bool) -> Option<Action> {
        let mods = Modifiers::from(event.modifiers);

        if mods.contains(Modifiers::CTRL) {
            return match event.code {
                KeyCode::Char('c') => Some(Action::Halt),
                KeyCode::Char('u') => Some(Action::ClearLine),
                KeyCode::Char('l') => Some(Action::ClearScreen),
                KeyCode::Char('d') if input_empty => Some(Action::Quit),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(ch) if !mods.contains(Modifiers::ALT) => Some(Action::Insert(ch)),
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => Some(Action::Backspace),
            // There is no cursor, so Right is always at end of line
            KeyCode::Tab | KeyCode::Right => Some(Action::Autocomplete),
            KeyCode::Up => Some(Action::HistoryPrevious),
            KeyCode::Down => Some(Action::HistoryNext),
            KeyCode::Esc => Some(Action::Quit),
            _ => None,
        }
    }
}
