//! In-memory session backend.
//!
//! Panes are plain text buffers. Typed text is echoed into the buffer the way
//! a shell's line editor would, and pressing Enter (or typing a line break)
//! "executes" the pending line: `echo` commands print their arguments, anything else prints nothing.
//! Faults can be injected to simulate a session torn down mid-run.

use super::{Key, Layout, PaneHandle, SessionBackend, SessionHandle, SessionOptions};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// One observable interaction with a pane, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEvent {
    Keys { pane: String, text: String },
    Key { pane: String, key: Key },
    Output { pane: String, text: String },
    Title { pane: String, title: String },
    Killed { session: String },
}

#[derive(Debug, Default)]
struct MemoryPane {
    session: String,
    buffer: String,
    line: String,
    title: String,
    executed: Vec<String>,
    alive: bool,
}

impl MemoryPane {
    fn accept_line(&mut self) {
        let line = std::mem::take(&mut self.line);
        self.buffer.push('\n');
        if let Some(args) = line.trim().strip_prefix("echo ") {
            self.buffer.push_str(args.trim());
            self.buffer.push('\n');
        }
        self.executed.push(line);
    }

    /// Echo typed text; a line break submits the pending line like Enter.
    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' | '\r' => self.accept_line(),
                c => {
                    self.buffer.push(c);
                    self.line.push(c);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct State {
    panes: HashMap<String, MemoryPane>,
    next_id: usize,
    events: Vec<MemoryEvent>,
    fail_on: Option<String>,
}

impl State {
    fn pane_mut(&mut self, pane: &PaneHandle) -> Result<&mut MemoryPane> {
        match self.panes.get_mut(pane.id()) {
            Some(p) if p.alive => Ok(p),
            _ => Err(Error::PaneNotFound {
                pane: pane.to_string(),
            }),
        }
    }

    fn new_pane(&mut self, session: &str) -> String {
        let id = format!("%{}", self.next_id);
        self.next_id += 1;
        self.panes.insert(
            id.clone(),
            MemoryPane {
                session: session.to_string(),
                alive: true,
                ..Default::default()
            },
        );
        id
    }

    fn kill(&mut self, session: &str) {
        for pane in self.panes.values_mut() {
            if pane.session == session {
                pane.alive = false;
            }
        }
    }

    /// Tear the pane's session down if `text` would complete the fault trigger.
    fn check_fault(&mut self, pane: &PaneHandle, text: &str) -> Result<()> {
        let Some(needle) = self.fail_on.clone() else {
            return Ok(());
        };
        let pending = {
            let p = self.pane_mut(pane)?;
            format!("{}{}", p.line, text)
        };
        if pending.contains(&needle) || text.contains(&needle) {
            self.fail_on = None;
            self.kill(pane.session());
            return Err(Error::PaneNotFound {
                pane: pane.to_string(),
            });
        }
        Ok(())
    }
}

/// Session backend that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test thread panicked; the data is fine.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Kill the owning session as soon as `needle` is about to reach a pane.
    ///
    /// The triggering write fails with [`Error::PaneNotFound`], as does every
    /// later operation on that session.
    pub fn fail_when_written(&self, needle: impl Into<String>) {
        self.state().fail_on = Some(needle.into());
    }

    /// Everything the pane ever displayed, readable even after it died.
    pub fn transcript(&self, pane: &PaneHandle) -> String {
        self.state()
            .panes
            .get(pane.id())
            .map(|p| p.buffer.clone())
            .unwrap_or_default()
    }

    /// Lines executed in the pane by pressing Enter, in order.
    pub fn executed(&self, pane: &PaneHandle) -> Vec<String> {
        self.state()
            .panes
            .get(pane.id())
            .map(|p| p.executed.clone())
            .unwrap_or_default()
    }

    /// Current pane title.
    pub fn title(&self, pane: &PaneHandle) -> Option<String> {
        self.state().panes.get(pane.id()).map(|p| p.title.clone())
    }

    /// Whether the pane's session is still alive.
    pub fn is_alive(&self, pane: &PaneHandle) -> bool {
        self.state()
            .panes
            .get(pane.id())
            .map(|p| p.alive)
            .unwrap_or(false)
    }

    /// Every recorded interaction, in call order.
    pub fn events(&self) -> Vec<MemoryEvent> {
        self.state().events.clone()
    }
}

impl SessionBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn create_session(&self, name: &str, _options: &SessionOptions) -> Result<SessionHandle> {
        let mut state = self.state();
        let taken = state.panes.values().any(|p| p.alive && p.session == name);
        if taken {
            return Err(Error::Multiplexer {
                command: "new-session".to_string(),
                stderr: format!("duplicate session: {}", name),
            });
        }
        let id = state.new_pane(name);
        Ok(SessionHandle {
            name: name.to_string(),
            main_pane: PaneHandle::new(id, name),
        })
    }

    fn split_pane(
        &self,
        session: &SessionHandle,
        layout: &Layout,
        options: &SessionOptions,
    ) -> Result<PaneHandle> {
        match layout {
            Layout::Session { name } => Ok(self.create_session(name, options)?.main_pane),
            Layout::Right { percent } | Layout::Below { percent } => {
                if *percent == 0 || *percent >= 100 {
                    return Err(Error::PaneCreationFailed {
                        reason: format!("no space for a {}% pane", percent),
                    });
                }
                let mut state = self.state();
                state.pane_mut(&session.main_pane)?;
                let id = state.new_pane(&session.name);
                Ok(PaneHandle::new(id, session.name.clone()))
            }
        }
    }

    fn send_keys(&self, pane: &PaneHandle, text: &str) -> Result<()> {
        let mut state = self.state();
        state.check_fault(pane, text)?;
        state.pane_mut(pane)?.type_text(text);
        state.events.push(MemoryEvent::Keys {
            pane: pane.id().to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn send_key(&self, pane: &PaneHandle, key: &Key) -> Result<()> {
        let mut state = self.state();
        let p = state.pane_mut(pane)?;
        match key {
            Key::Enter => p.accept_line(),
            Key::Backspace => {
                if p.line.pop().is_some() {
                    p.buffer.pop();
                }
            }
            _ => {}
        }
        state.events.push(MemoryEvent::Key {
            pane: pane.id().to_string(),
            key: key.clone(),
        });
        Ok(())
    }

    fn write_output(&self, pane: &PaneHandle, text: &str) -> Result<()> {
        let mut state = self.state();
        state.check_fault(pane, text)?;
        state.pane_mut(pane)?.buffer.push_str(text);
        state.events.push(MemoryEvent::Output {
            pane: pane.id().to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn capture_buffer(&self, pane: &PaneHandle) -> Result<String> {
        Ok(self.state().pane_mut(pane)?.buffer.clone())
    }

    fn set_title(&self, pane: &PaneHandle, title: &str) -> Result<()> {
        let mut state = self.state();
        state.pane_mut(pane)?.title = title.to_string();
        state.events.push(MemoryEvent::Title {
            pane: pane.id().to_string(),
            title: title.to_string(),
        });
        Ok(())
    }

    fn kill_session(&self, session: &str) -> Result<()> {
        let mut state = self.state();
        if !state.panes.values().any(|p| p.alive && p.session == session) {
            return Err(Error::PaneNotFound {
                pane: session.to_string(),
            });
        }
        state.kill(session);
        state.events.push(MemoryEvent::Killed {
            session: session.to_string(),
        });
        Ok(())
    }

    fn has_session(&self, name: &str) -> bool {
        self.state()
            .panes
            .values()
            .any(|p| p.alive && p.session == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(backend: &MemoryBackend) -> SessionHandle {
        backend
            .create_session("demo", &SessionOptions::default())
            .unwrap()
    }

    #[test]
    fn typed_echo_prints_its_arguments_on_enter() {
        let backend = MemoryBackend::new();
        let pane = session(&backend).main_pane;

        backend.send_keys(&pane, "echo hi").unwrap();
        backend.send_key(&pane, &Key::Enter).unwrap();

        assert_eq!(backend.capture_buffer(&pane).unwrap(), "echo hi\nhi\n");
        assert_eq!(backend.executed(&pane), vec!["echo hi".to_string()]);
    }

    #[test]
    fn typed_line_break_submits_the_line() {
        let backend = MemoryBackend::new();
        let pane = session(&backend).main_pane;

        backend.send_keys(&pane, "echo first\necho sec").unwrap();

        assert_eq!(backend.executed(&pane), vec!["echo first".to_string()]);
        assert_eq!(
            backend.capture_buffer(&pane).unwrap(),
            "echo first\nfirst\necho sec"
        );
    }

    #[test]
    fn backspace_removes_pending_character() {
        let backend = MemoryBackend::new();
        let pane = session(&backend).main_pane;

        backend.send_keys(&pane, "lx").unwrap();
        backend.send_key(&pane, &Key::Backspace).unwrap();
        backend.send_keys(&pane, "s").unwrap();
        backend.send_key(&pane, &Key::Enter).unwrap();

        assert_eq!(backend.executed(&pane), vec!["ls".to_string()]);
    }

    #[test]
    fn split_into_private_session_creates_new_session() {
        let backend = MemoryBackend::new();
        let main = session(&backend);
        let layout = Layout::Session {
            name: "demo-speaker".to_string(),
        };
        let speaker = backend
            .split_pane(&main, &layout, &SessionOptions::default())
            .unwrap();

        assert_eq!(speaker.session(), "demo-speaker");
        assert_ne!(speaker.id(), main.main_pane.id());
    }

    #[test]
    fn impossible_split_fails() {
        let backend = MemoryBackend::new();
        let main = session(&backend);
        let err = backend
            .split_pane(&main, &Layout::Right { percent: 100 }, &SessionOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::PaneCreationFailed { .. }));
    }

    #[test]
    fn killed_session_makes_handles_stale() {
        let backend = MemoryBackend::new();
        let pane = session(&backend).main_pane;
        backend.send_keys(&pane, "before").unwrap();

        backend.kill_session("demo").unwrap();

        assert!(matches!(
            backend.send_keys(&pane, "x"),
            Err(Error::PaneNotFound { .. })
        ));
        assert!(backend.capture_buffer(&pane).is_err());
        assert_eq!(backend.transcript(&pane), "before");
    }

    #[test]
    fn fault_trigger_spans_individual_keystrokes() {
        let backend = MemoryBackend::new();
        let pane = session(&backend).main_pane;
        backend.fail_when_written("boom");

        for c in ["b", "o", "o"] {
            backend.send_keys(&pane, c).unwrap();
        }
        let err = backend.send_keys(&pane, "m").unwrap_err();

        assert!(matches!(err, Error::PaneNotFound { .. }));
        assert!(!backend.is_alive(&pane));
    }

    #[test]
    fn duplicate_session_names_are_rejected() {
        let backend = MemoryBackend::new();
        session(&backend);
        assert!(backend
            .create_session("demo", &SessionOptions::default())
            .is_err());
    }
}
