//! Steps and scripts.
//!
//! A [`Script`] is a flat, ordered log of [`Step`]s assembled through the
//! append-only [`ScriptBuilder`]. Once built it is read-only: playback state
//! (which step is next, whether a pause is being held) lives in the
//! presentation controller, never in the steps themselves.

mod file;

pub use file::{ScriptFile, StepSpec};

use crate::backend::Key;
use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Content shown on the audience surface without typing simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayContent {
    /// Literal text written straight to the pane
    Text(String),
    /// Picture rendered to text by the configured image viewer
    Image(PathBuf),
    /// Markdown slide rendered by the configured markdown viewer
    Markdown(PathBuf),
}

impl DisplayContent {
    /// Short, single-line description for the speaker surface.
    pub fn summary(&self) -> String {
        match self {
            Self::Text(text) => first_line("text", text),
            Self::Image(path) => format!("image: {}", path.display()),
            Self::Markdown(path) => format!("slide: {}", path.display()),
        }
    }
}

/// `label: first line`, noting how many lines were left out.
fn first_line(label: &str, text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    match text.lines().count() {
        0 | 1 => format!("{}: {}", label, first),
        lines => format!("{}: {} (+{} more lines)", label, first, lines - 1),
    }
}

/// One authored action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Section heading shown to the audience
    Chapter { title: String },
    /// Speaker-only commentary
    Note { text: String },
    /// Shell command typed into the audience pane, then executed
    Command { text: String },
    /// Pre-rendered content shown to the audience
    Display { content: DisplayContent },
    /// Explicit hold point, with an optional hint for the presenter
    Pause { hint: Option<String> },
    /// Named key presses sent to the audience pane
    Keys { keys: Vec<Key> },
    /// Literal input for whatever program runs in the audience pane; no
    /// Enter is added. `paced` types it like a command, otherwise it is sent
    /// in one write.
    Raw { text: String, paced: bool },
    /// Fixed delay with no rendering
    Sleep { duration: Duration },
}

impl Step {
    /// Lowercase kind name, for logs and the presenter console.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chapter { .. } => "chapter",
            Self::Note { .. } => "note",
            Self::Command { .. } => "command",
            Self::Display { .. } => "display",
            Self::Pause { .. } => "pause",
            Self::Keys { .. } => "keys",
            Self::Raw { .. } => "raw",
            Self::Sleep { .. } => "sleep",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter { title } => write!(f, "chapter: {}", title),
            Self::Note { text } => write!(f, "note: {}", text.lines().next().unwrap_or_default()),
            Self::Command { text } => write!(f, "$ {}", text),
            Self::Display { content } => write!(f, "display {}", content.summary()),
            Self::Pause { hint: Some(hint) } => write!(f, "pause: {}", hint),
            Self::Pause { hint: None } => write!(f, "pause"),
            Self::Keys { keys } => {
                let names: Vec<&str> = keys.iter().map(Key::tmux_name).collect();
                write!(f, "keys: {}", names.join(" "))
            }
            Self::Raw { text, .. } => f.write_str(&first_line("raw", text)),
            Self::Sleep { duration } => write!(f, "sleep {}ms", duration.as_millis()),
        }
    }
}

/// An ordered, immutable sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Start authoring a new script.
    pub fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    /// Steps in playback order.
    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Append-only authoring API.
///
/// Each call appends exactly one step; insertion order is playback order.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    steps: Vec<Step>,
}

impl ScriptBuilder {
    pub fn append(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn chapter(&mut self, title: impl Into<String>) -> &mut Self {
        self.append(Step::Chapter {
            title: title.into(),
        })
    }

    pub fn note(&mut self, text: impl Into<String>) -> &mut Self {
        self.append(Step::Note { text: text.into() })
    }

    /// Type a command into the audience pane and execute it.
    ///
    /// A single trailing newline is dropped; Enter is always pressed once.
    /// Line breaks anywhere else are rejected by [`ScriptBuilder::build`],
    /// since the shell would run the first line before Enter.
    pub fn cmd(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        let text = text
            .strip_suffix("\r\n")
            .or_else(|| text.strip_suffix('\n'))
            .unwrap_or(&text)
            .to_string();
        self.append(Step::Command { text })
    }

    pub fn display(&mut self, content: DisplayContent) -> &mut Self {
        self.append(Step::Display { content })
    }

    pub fn wait(&mut self) -> &mut Self {
        self.append(Step::Pause { hint: None })
    }

    /// Pause with a hint shown only to the presenter.
    pub fn wait_for(&mut self, hint: impl Into<String>) -> &mut Self {
        self.append(Step::Pause {
            hint: Some(hint.into()),
        })
    }

    pub fn keys(&mut self, keys: impl IntoIterator<Item = Key>) -> &mut Self {
        self.append(Step::Keys {
            keys: keys.into_iter().collect(),
        })
    }

    /// Send text as input to the program in the audience pane, in one write.
    ///
    /// Unlike [`ScriptBuilder::cmd`] nothing is pressed afterwards and line
    /// breaks are kept, for feeding editors and REPLs.
    pub fn raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.append(Step::Raw {
            text: text.into(),
            paced: false,
        })
    }

    /// Like [`ScriptBuilder::raw`], typed with human cadence.
    pub fn raw_typed(&mut self, text: impl Into<String>) -> &mut Self {
        self.append(Step::Raw {
            text: text.into(),
            paced: true,
        })
    }

    pub fn sleep(&mut self, duration: Duration) -> &mut Self {
        self.append(Step::Sleep { duration })
    }

    /// Number of steps appended so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Finish authoring.
    ///
    /// An empty script is rejected: there would be nothing to present.
    pub fn build(&mut self) -> Result<Script> {
        if self.steps.is_empty() {
            return Err(Error::Authoring(
                "script has no steps; add at least one before running".to_string(),
            ));
        }
        for (index, step) in self.steps.iter().enumerate() {
            if let Step::Command { text } = step {
                if text.trim().is_empty() {
                    return Err(Error::Authoring(format!(
                        "step {} is an empty command",
                        index + 1
                    )));
                }
                if text.contains(['\n', '\r']) {
                    return Err(Error::Authoring(format!(
                        "step {} spans several lines; split it into one cmd per line",
                        index + 1
                    )));
                }
            }
            if let Step::Raw { text, .. } = step {
                if text.is_empty() {
                    return Err(Error::Authoring(format!(
                        "step {} sends no text",
                        index + 1
                    )));
                }
            }
            if let Step::Keys { keys } = step {
                if keys.is_empty() {
                    return Err(Error::Authoring(format!(
                        "step {} sends no keys",
                        index + 1
                    )));
                }
            }
        }
        Ok(Script {
            steps: std::mem::take(&mut self.steps),
        })
    }
}
