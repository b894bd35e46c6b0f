//! Presentation controller
//!
//! Walks a [`Script`] one step per advance signal, dispatching each step's
//! routes to the audience and speaker surfaces. Rendering is strictly
//! sequential: a step's routes all finish before the next signal is read.
//!
//! # Module Structure
//!
//! - `state`: status enum and run outcome
//! - `surfaces`: audience/speaker pane setup
//! - `render`: execution of individual routes

mod render;
pub mod state;
mod surfaces;

pub use state::{Outcome, Status};
pub use surfaces::Surfaces;

use crate::backend::SessionBackend;
use crate::config::ViewerConfig;
use crate::error::{Error, Result, RunFailure};
use crate::script::{Script, Step};
use crate::signals::{Signal, SignalFlags, Signals};
use crate::theme::Theme;
use crate::typing::{TypingOptions, Typist};
use crate::viewer::{ExternalViewer, Renderer};
use state::StepResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// How often a blocked controller re-checks the abort flag.
const SIGNAL_POLL: Duration = Duration::from_millis(100);

type StatusHook = Box<dyn FnMut(&Status) + Send>;

/// Replays a script against a session backend.
pub struct Presentation {
    script: Script,
    backend: Arc<dyn SessionBackend>,
    surfaces: Surfaces,
    typist: Typist,
    renderer: Arc<dyn Renderer>,
    theme: Theme,
    fresh_prompt: bool,
    status: Status,
    cursor: usize,
    /// A pause step was rendered and is waiting for its releasing advance
    holding: bool,
    started: bool,
    aborted: bool,
    torn_down: bool,
    on_status: Option<StatusHook>,
}

impl Presentation {
    pub fn new(script: Script, backend: Arc<dyn SessionBackend>, surfaces: Surfaces) -> Self {
        Self {
            script,
            backend,
            surfaces,
            typist: Typist::new(TypingOptions::default()),
            renderer: Arc::new(ExternalViewer::new(ViewerConfig::default())),
            theme: Theme::default(),
            fresh_prompt: true,
            status: Status::Idle,
            cursor: 0,
            holding: false,
            started: false,
            aborted: false,
            torn_down: false,
            on_status: None,
        }
    }

    pub fn with_typist(mut self, typist: Typist) -> Self {
        self.typist = typist;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Press Enter after chapter banners so a fresh prompt shows below them.
    pub fn with_fresh_prompt(mut self, fresh_prompt: bool) -> Self {
        self.fresh_prompt = fresh_prompt;
        self
    }

    /// Called on every status change.
    pub fn on_status(mut self, hook: impl FnMut(&Status) + Send + 'static) -> Self {
        self.on_status = Some(Box::new(hook));
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        if self.status != status {
            debug!(from = %self.status, to = %status, "status change");
        }
        self.status = status;
        if let Some(hook) = self.on_status.as_mut() {
            hook(&status);
        }
    }

    /// Leave `Idle` and wait at the first step.
    ///
    /// A presentation runs once; starting it again is an authoring error.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::Authoring(
                "presentation has already been run".to_string(),
            ));
        }
        if self.script.is_empty() {
            return Err(Error::Authoring("script has no steps".to_string()));
        }
        self.started = true;
        info!(steps = self.script.len(), "presentation started");
        self.set_status(Status::AwaitingAdvance { cursor: 0 });
        Ok(())
    }

    /// Handle one advance signal.
    ///
    /// Renders the step at the cursor and returns the resulting status. A
    /// held pause is released first; if the pause was the last step the run
    /// finishes without rendering anything. Terminal states are absorbing.
    /// A fatal backend error moves to `Failed`, tears the sessions down and
    /// is returned as [`Error::Run`].
    pub fn advance(&mut self, flags: &SignalFlags) -> Result<Status> {
        let cursor = match self.status {
            Status::AwaitingAdvance { cursor } => cursor,
            Status::Idle => {
                debug!("advance ignored before start");
                return Ok(self.status);
            }
            status => return Ok(status),
        };
        if flags.abort_requested() {
            return Ok(self.abort());
        }

        let index = if self.holding {
            self.holding = false;
            cursor + 1
        } else {
            cursor
        };
        self.cursor = index;
        if index >= self.script.len() {
            return Ok(self.finish());
        }

        self.set_status(Status::Rendering { cursor: index });
        flags.set_rendering(true);
        let result = self.render_step(index, flags);
        flags.set_rendering(false);

        match result {
            Ok(StepResult::Aborted) => Ok(self.abort()),
            Ok(StepResult::Done) => {
                if matches!(self.script.get(index), Some(Step::Pause { .. })) {
                    self.holding = true;
                    self.set_status(Status::AwaitingAdvance { cursor: index });
                    return Ok(self.status);
                }
                self.cursor = index + 1;
                if self.cursor >= self.script.len() {
                    return Ok(self.finish());
                }
                self.set_status(Status::AwaitingAdvance {
                    cursor: self.cursor,
                });
                Ok(self.status)
            }
            Err(error) => {
                error!(step = index, error = %error, "step failed");
                self.set_status(Status::Failed {
                    step: index,
                    cursor: index,
                });
                self.teardown();
                Err(RunFailure {
                    step: index,
                    cursor: index,
                    error,
                }
                .into())
            }
        }
    }

    fn finish(&mut self) -> Status {
        info!(steps = self.script.len(), "presentation complete");
        self.set_status(Status::Finished);
        self.status
    }

    /// Stop the run and release the sessions.
    ///
    /// Ends in `Finished`, since a stop requested by the presenter is not a
    /// failure. A no-op once the run is over.
    pub fn abort(&mut self) -> Status {
        if self.status.is_terminal() {
            return self.status;
        }
        info!(cursor = self.cursor, "presentation aborted");
        self.aborted = true;
        self.teardown();
        self.set_status(Status::Finished);
        self.status
    }

    /// Drive the whole presentation from a signal source.
    ///
    /// Returns once every step is done or the presenter aborts. On normal
    /// completion the sessions stay up until [`Presentation::teardown`], so
    /// the audience still sees the last output.
    pub fn run(&mut self, signals: &Signals) -> Result<Outcome> {
        self.start()?;
        let flags = signals.flags();
        while !self.status.is_terminal() {
            match signals.wait(SIGNAL_POLL) {
                Signal::Advance => {
                    self.advance(flags)?;
                }
                Signal::Skip => {
                    // Nothing is typing between steps
                    flags.clear_skip();
                    debug!("skip ignored while awaiting advance");
                }
                Signal::Abort => {
                    self.abort();
                }
            }
        }
        Ok(if self.aborted {
            Outcome::Aborted
        } else {
            Outcome::Completed
        })
    }

    /// Kill every session this presentation created. Best effort; runs once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        for session in self.surfaces.sessions() {
            match self.backend.kill_session(session) {
                Ok(()) => debug!(%session, "session killed"),
                Err(e) => debug!(%session, error = %e, "session already gone"),
            }
        }
    }
}
