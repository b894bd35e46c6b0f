//! Controller state
//!
//! The status enum the controller moves through, and the outcome of a
//! completed run.

use std::fmt;

/// Where the controller is in its run.
///
/// `cursor` is always the number of steps already completed, except while a
/// pause is held: then it points at the pause itself, which completes on the
/// next advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Constructed, not yet started
    Idle,
    /// Blocked on presenter input at a step boundary
    AwaitingAdvance { cursor: usize },
    /// Dispatching the step at `cursor`
    Rendering { cursor: usize },
    /// Every step done, or stopped by an abort
    Finished,
    /// Stopped by a fatal backend error while rendering `step`
    Failed { step: usize, cursor: usize },
}

impl Status {
    /// Whether no further signal can change this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed { .. })
    }

    /// Short label for the presenter console.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::AwaitingAdvance { .. } => "Paused",
            Self::Rendering { .. } => "Playing",
            Self::Finished => "Complete",
            Self::Failed { .. } => "Failed",
        }
    }

    /// Steps completed so far, when meaningful.
    pub fn cursor(&self) -> Option<usize> {
        match self {
            Self::AwaitingAdvance { cursor }
            | Self::Rendering { cursor }
            | Self::Failed { cursor, .. } => Some(*cursor),
            Self::Idle | Self::Finished => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingAdvance { cursor } | Self::Rendering { cursor } => {
                write!(f, "{} at step {}", self.label(), cursor + 1)
            }
            Self::Failed { step, .. } => write!(f, "Failed at step {}", step + 1),
            _ => f.write_str(self.label()),
        }
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every step was rendered
    Completed,
    /// The presenter stopped the run early
    Aborted,
}

/// Result of dispatching a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepResult {
    Done,
    Aborted,
}
