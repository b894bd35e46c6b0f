//! Error taxonomy for the presentation engine.

use std::process::ExitStatus;

/// Errors that can occur while setting up or replaying a presentation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The multiplexer binary cannot be located or its server is unreachable.
    #[error("Terminal multiplexer unavailable: {0}")]
    BackendUnavailable(String),

    /// The requested pane layout cannot be satisfied.
    #[error("Could not create pane: {reason}")]
    PaneCreationFailed { reason: String },

    /// The pane (or its whole session) was torn down underneath us.
    #[error("Pane not found: {pane}")]
    PaneNotFound { pane: String },

    /// An external viewer process exited unsuccessfully.
    #[error("Display renderer '{program}' failed ({status}): {stderr}")]
    DisplayRenderFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The script was built or driven incorrectly.
    #[error("Authoring error: {0}")]
    Authoring(String),

    /// Any other non-zero exit from the multiplexer.
    #[error("tmux {command} failed: {stderr}")]
    Multiplexer { command: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A presentation stopped on a fatal error mid-run.
    #[error(transparent)]
    Run(Box<RunFailure>),
}

impl Error {
    /// Build a `DisplayRenderFailed` from a finished viewer process.
    pub fn render_failed(program: &str, status: ExitStatus, stderr: &[u8]) -> Self {
        let status = match status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        Self::DisplayRenderFailed {
            program: program.to_string(),
            status,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Whether playback may continue to the next step after this error.
    ///
    /// Only display failures are local: they never touch shared session state.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DisplayRenderFailed { .. })
    }

    /// Step and cursor details when this is a mid-run failure.
    pub fn run_failure(&self) -> Option<&RunFailure> {
        match self {
            Self::Run(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<RunFailure> for Error {
    fn from(failure: RunFailure) -> Self {
        Self::Run(Box::new(failure))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A fatal error raised while rendering a step.
#[derive(Debug, thiserror::Error)]
#[error("Presentation failed at step {} ({} step(s) completed): {error}", .step + 1, .cursor)]
pub struct RunFailure {
    /// Index of the step that was being rendered.
    pub step: usize,
    /// Number of steps that completed before the failure.
    pub cursor: usize,
    #[source]
    pub error: Error,
}
