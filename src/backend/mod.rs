//! Session backends.
//!
//! A backend is the only part of the engine that talks to the outside world:
//! it creates multiplexer sessions, splits them into addressable panes, and
//! injects keystrokes or output into those panes.
//!
//! - [`TmuxBackend`] drives a private tmux server over its CLI.
//! - [`MemoryBackend`] keeps pane buffers in memory (tests and dry runs).

mod memory;
mod naming;
mod tmux;

pub use memory::{MemoryBackend, MemoryEvent};
pub use naming::session_name;
pub use tmux::TmuxBackend;

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Opaque reference to a pane inside a backend session.
///
/// Only valid for as long as the owning session is alive; using a stale
/// handle yields [`Error::PaneNotFound`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaneHandle {
    id: String,
    session: String,
}

impl PaneHandle {
    pub fn new(id: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session: session.into(),
        }
    }

    /// Backend-specific pane identifier (e.g. tmux `%3`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the session that owns this pane.
    pub fn session(&self) -> &str {
        &self.session
    }
}

impl fmt::Display for PaneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session, self.id)
    }
}

/// A created session and the pane it starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub name: String,
    pub main_pane: PaneHandle,
}

/// How a new session or pane is started.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Working directory for the pane's process
    pub cwd: Option<PathBuf>,
    /// Command to run instead of the default shell
    pub command: Option<String>,
    /// Extra environment for the pane's process
    pub env: Vec<(String, String)>,
    /// Initial width in columns (0 = backend default)
    pub width: u16,
    /// Initial height in rows (0 = backend default)
    pub height: u16,
}

/// Where an additional pane is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Split the session's window, new pane on the right
    Right { percent: u8 },
    /// Split the session's window, new pane below
    Below { percent: u8 },
    /// Place the pane in its own sibling session, so that clients attached
    /// to the main session never see it
    Session { name: String },
}

/// A non-literal key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    Tab,
    /// Any other key in tmux notation (`C-x`, `M-x`, `F5`, `Up`, ...)
    Named(String),
}

impl Key {
    /// The key's name as understood by `tmux send-keys`.
    pub fn tmux_name(&self) -> &str {
        match self {
            Self::Enter => "Enter",
            Self::Backspace => "BSpace",
            Self::Escape => "Escape",
            Self::Tab => "Tab",
            Self::Named(name) => name,
        }
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(Error::Authoring(format!("Invalid key name: '{}'", s)));
        }
        Ok(match trimmed.to_ascii_lowercase().as_str() {
            "enter" | "return" => Self::Enter,
            "bspace" | "backspace" => Self::Backspace,
            "escape" | "esc" => Self::Escape,
            "tab" => Self::Tab,
            _ => Self::Named(trimmed.to_string()),
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tmux_name())
    }
}

/// Primitive operations over a terminal multiplexer.
///
/// Implementations hold no state beyond a registry of live panes. Errors from
/// the underlying multiplexer are surfaced as-is and never retried.
pub trait SessionBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Create a detached session and return it with its first pane.
    fn create_session(&self, name: &str, options: &SessionOptions) -> Result<SessionHandle>;

    /// Create an additional addressable pane.
    fn split_pane(
        &self,
        session: &SessionHandle,
        layout: &Layout,
        options: &SessionOptions,
    ) -> Result<PaneHandle>;

    /// Write literal text to the pane as if typed.
    fn send_keys(&self, pane: &PaneHandle, text: &str) -> Result<()>;

    /// Press a single non-literal key in the pane.
    fn send_key(&self, pane: &PaneHandle, key: &Key) -> Result<()>;

    /// Write text to the pane's terminal as output, bypassing whatever
    /// program reads the pane's input.
    fn write_output(&self, pane: &PaneHandle, text: &str) -> Result<()>;

    /// Current rendered contents of the pane, including scrollback.
    fn capture_buffer(&self, pane: &PaneHandle) -> Result<String>;

    /// Set the pane title.
    fn set_title(&self, pane: &PaneHandle, title: &str) -> Result<()>;

    /// Destroy a session and every pane in it.
    fn kill_session(&self, session: &str) -> Result<()>;

    /// Whether a live session of exactly this name exists.
    fn has_session(&self, name: &str) -> bool;
}
