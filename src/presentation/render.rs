//! Route execution
//!
//! Turns the routes of a single step into backend calls. Everything that
//! decides *where* output goes lives in the router; this module only knows
//! *how* each rendering mode looks.

use super::state::StepResult;
use super::Presentation;
use crate::backend::{Key, PaneHandle};
use crate::error::Result;
use crate::router::{self, RenderMode, Route, Surface};
use crate::signals::SignalFlags;
use crate::theme::Theme;
use crate::typing::{Terminator, TypingOutcome};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

/// Clear screen and home the cursor.
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Chapter banner: bold accent title over a rule of the same width.
pub(crate) fn banner(theme: &Theme, title: &str) -> String {
    let width = UnicodeWidthStr::width(title).max(1);
    format!(
        "{}{}\r\n{}\r\n",
        CLEAR,
        theme.accent_bold_text(title),
        theme.accent_text(&"─".repeat(width))
    )
}

/// Waiting indicator for a held pause.
pub(crate) fn waiting(theme: &Theme, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => format!(
            "{} {}\r\n",
            theme.accent_text("[waiting]"),
            theme.primary_text(hint)
        ),
        None => format!("{}\r\n", theme.accent_text("[waiting]")),
    }
}

/// Pane output wants CRLF; the tty is not cooked for direct writes.
fn crlf(text: &str) -> String {
    let mut out = text.replace("\r\n", "\n").replace('\n', "\r\n");
    if !out.ends_with("\r\n") {
        out.push_str("\r\n");
    }
    out
}

impl Presentation {
    /// Dispatch every route of the step at `index`, in order.
    pub(crate) fn render_step(&mut self, index: usize, flags: &SignalFlags) -> Result<StepResult> {
        let routes = match self.script.get(index) {
            Some(step) => router::route(step),
            None => return Ok(StepResult::Done),
        };
        for route in routes {
            if self.render_route(route, flags)? == StepResult::Aborted {
                return Ok(StepResult::Aborted);
            }
        }
        Ok(StepResult::Done)
    }

    fn pane(&self, surface: Surface) -> PaneHandle {
        match surface {
            Surface::Audience => self.surfaces.audience.clone(),
            Surface::Speaker => self.surfaces.speaker.clone(),
        }
    }

    fn render_route(&mut self, route: Route, flags: &SignalFlags) -> Result<StepResult> {
        let pane = self.pane(route.surface);
        let backend = self.backend.as_ref();
        debug!(surface = ?route.surface, %pane, "render route");

        match route.mode {
            RenderMode::Banner(title) => {
                backend.write_output(&pane, &banner(&self.theme, &title))?;
                backend.set_title(&pane, &title)?;
                if self.fresh_prompt {
                    backend.send_key(&pane, &Key::Enter)?;
                }
            }
            RenderMode::TypeAndExecute(text) => {
                let outcome =
                    self.typist
                        .type_text(backend, &pane, &text, Terminator::Enter, flags)?;
                debug!(?outcome, "typing finished");
                if outcome == TypingOutcome::Aborted {
                    return Ok(StepResult::Aborted);
                }
            }
            RenderMode::Render(content) => match self.renderer.render(&content) {
                Ok(output) => backend.write_output(&pane, &crlf(&output))?,
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "display step failed, continuing");
                    let line = self.theme.error_text(&format!("! {}", e));
                    backend.write_output(&self.surfaces.speaker, &crlf(&line))?;
                }
                Err(e) => return Err(e),
            },
            RenderMode::Input { text, paced: true } => {
                let outcome =
                    self.typist
                        .type_text(backend, &pane, &text, Terminator::None, flags)?;
                if outcome == TypingOutcome::Aborted {
                    return Ok(StepResult::Aborted);
                }
            }
            RenderMode::Input { text, paced: false } => {
                if flags.abort_requested() {
                    return Ok(StepResult::Aborted);
                }
                backend.send_keys(&pane, &text)?;
            }
            RenderMode::PressKeys(keys) => {
                for key in &keys {
                    if flags.abort_requested() {
                        return Ok(StepResult::Aborted);
                    }
                    backend.send_key(&pane, key)?;
                }
            }
            RenderMode::Echo(line) => {
                backend.write_output(&pane, &crlf(&self.theme.secondary_text(&line)))?;
            }
            RenderMode::NoteText(text) => {
                let body: Vec<String> = text
                    .lines()
                    .map(|line| self.theme.primary_text(line))
                    .collect();
                backend.write_output(&pane, &crlf(&body.join("\n")))?;
            }
            RenderMode::Waiting(hint) => {
                backend.write_output(&pane, &waiting(&self.theme, hint.as_deref()))?;
            }
            RenderMode::Hold(duration) => {
                if !self.typist.hold(duration, flags) {
                    return Ok(StepResult::Aborted);
                }
            }
        }
        Ok(StepResult::Done)
    }
}
