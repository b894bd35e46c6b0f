//! Audience and speaker panes.

use crate::backend::{Layout, PaneHandle, SessionBackend, SessionOptions};
use crate::config::{SessionConfig, SpeakerLayout};
use crate::error::Result;
use tracing::{debug, info, warn};

/// Keeps the speaker pane open without a prompt of its own; everything it
/// shows is written to its tty directly.
const SPEAKER_COMMAND: &str = "tail -f /dev/null";

/// The two panes a presentation renders into, plus the sessions that own
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surfaces {
    pub audience: PaneHandle,
    pub speaker: PaneHandle,
    sessions: Vec<String>,
}

impl Surfaces {
    /// Create the audience session and place the speaker pane.
    ///
    /// If the speaker pane cannot be created the audience session is killed
    /// again, so a failed setup leaves nothing behind.
    pub fn open(
        backend: &dyn SessionBackend,
        name: &str,
        config: &SessionConfig,
        audience: &SessionOptions,
    ) -> Result<Self> {
        let session = backend.create_session(name, audience)?;
        info!(session = %session.name, pane = %session.main_pane, "audience session created");

        let layout = speaker_layout(name, config);
        let speaker_options = SessionOptions {
            command: Some(SPEAKER_COMMAND.to_string()),
            width: audience.width,
            height: audience.height,
            ..SessionOptions::default()
        };
        let speaker = match backend.split_pane(&session, &layout, &speaker_options) {
            Ok(pane) => pane,
            Err(e) => {
                if let Err(kill) = backend.kill_session(&session.name) {
                    debug!(error = %kill, "cleanup after failed split");
                }
                return Err(e);
            }
        };
        info!(pane = %speaker, ?layout, "speaker pane created");

        let mut sessions = vec![session.name.clone()];
        if speaker.session() != session.name {
            sessions.push(speaker.session().to_string());
        }
        Ok(Self {
            audience: session.main_pane,
            speaker,
            sessions,
        })
    }

    /// Kill sessions left behind under `name` by an earlier run that did
    /// not shut down. Returns the names that were killed.
    pub fn clear_stale(backend: &dyn SessionBackend, name: &str) -> Result<Vec<String>> {
        let mut killed = Vec::new();
        for session in [name.to_string(), Self::speaker_session_name(name)] {
            if backend.has_session(&session) {
                warn!(%session, "killing session left over from an earlier run");
                backend.kill_session(&session)?;
                killed.push(session);
            }
        }
        Ok(killed)
    }

    /// Sessions owned by this presentation, audience first.
    pub fn sessions(&self) -> &[String] {
        &self.sessions
    }

    /// Name of the private session holding the speaker pane.
    pub fn speaker_session_name(name: &str) -> String {
        format!("{}-speaker", name)
    }
}

fn speaker_layout(name: &str, config: &SessionConfig) -> Layout {
    match config.speaker_layout {
        SpeakerLayout::Session => Layout::Session {
            name: Surfaces::speaker_session_name(name),
        },
        SpeakerLayout::Right => Layout::Right {
            percent: config.speaker_percent,
        },
        SpeakerLayout::Below => Layout::Below {
            percent: config.speaker_percent,
        },
    }
}
