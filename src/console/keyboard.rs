//! Keyboard input for the presenter console.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::signals::Signal;

/// What a key press asks the console to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Forward a signal to the controller
    Signal(Signal),
    /// Show or hide the help overlay
    ToggleHelp,
    /// Hand the terminal to a tmux client until it detaches
    AttachTmux,
    /// Kill the tmux server and stop
    KillServer,
    /// Nothing bound to this key
    Ignore,
}

/// Map a key event to a console action.
///
/// While help is showing any key closes it, except Ctrl-C which still
/// aborts.
pub fn map_key(key: KeyEvent, help_visible: bool) -> ConsoleAction {
    if key.kind == KeyEventKind::Release {
        return ConsoleAction::Ignore;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return ConsoleAction::Signal(Signal::Abort);
    }
    if help_visible {
        return ConsoleAction::ToggleHelp;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('a') | KeyCode::Char('b') => ConsoleAction::AttachTmux,
            _ => ConsoleAction::Ignore,
        };
    }

    match key.code {
        // === Advance ===
        KeyCode::Char('n')
        | KeyCode::Char('l')
        | KeyCode::Char('j')
        | KeyCode::Char(' ')
        | KeyCode::Enter
        | KeyCode::Right
        | KeyCode::Down
        | KeyCode::PageDown => ConsoleAction::Signal(Signal::Advance),

        // === Skip ===
        KeyCode::Char('s') | KeyCode::Tab => ConsoleAction::Signal(Signal::Skip),

        // === Abort ===
        KeyCode::Char('q') => ConsoleAction::Signal(Signal::Abort),

        // === tmux ===
        KeyCode::Char('t') => ConsoleAction::AttachTmux,
        KeyCode::Char('K') => ConsoleAction::KillServer,

        KeyCode::Char('?') | KeyCode::Char('h') => ConsoleAction::ToggleHelp,

        _ => ConsoleAction::Ignore,
    }
}
