//! termstage - scripted live terminal demos on tmux
//!
//! A presentation is an ordered [`Script`] of steps. At run time the
//! [`Presentation`] controller replays it one step per presenter signal,
//! typing commands into an audience pane with human cadence while speaker
//! notes go to a pane the audience never sees.

pub mod backend;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod presentation;
pub mod router;
pub mod script;
pub mod signals;
pub mod theme;
pub mod typing;
pub mod viewer;
pub mod workdir;

pub use config::Config;
pub use error::{Error, Result, RunFailure};
pub use presentation::{Outcome, Presentation, Status, Surfaces};
pub use script::{DisplayContent, Script, ScriptBuilder, Step};
