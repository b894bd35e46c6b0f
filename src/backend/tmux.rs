//! tmux backend.
//!
//! Every operation is one `tmux -L <socket> ...` invocation against a private
//! server, so a presentation never touches the user's own tmux sessions.

use super::{Key, Layout, PaneHandle, SessionBackend, SessionHandle, SessionOptions};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use tracing::debug;

/// Stderr fragments tmux prints when a target no longer exists.
const GONE_MARKERS: &[&str] = &[
    "can't find pane",
    "can't find session",
    "can't find window",
    "no server running",
    "server exited",
    "lost server",
];

/// Stderr fragments tmux prints when a split does not fit.
const NO_SPACE_MARKERS: &[&str] = &["no space for new pane", "create pane failed"];

/// Session backend driving an external tmux server.
pub struct TmuxBackend {
    /// Socket name passed to `tmux -L`
    socket: String,
    /// Config file used when the server starts
    config_file: Option<PathBuf>,
    /// Live panes by pane id, with their tty once looked up
    panes: Mutex<HashMap<String, Option<PathBuf>>>,
}

impl TmuxBackend {
    /// Create a backend on a private socket.
    ///
    /// Fails with [`Error::BackendUnavailable`] if tmux cannot be run.
    pub fn new(socket: impl Into<String>) -> Result<Self> {
        let output = Command::new("tmux").arg("-V").output().map_err(|e| {
            Error::BackendUnavailable(format!("cannot run tmux ({}); is it installed?", e))
        })?;
        if !output.status.success() {
            return Err(Error::BackendUnavailable(
                "tmux -V failed - ensure tmux is installed and working".to_string(),
            ));
        }
        debug!(version = %String::from_utf8_lossy(&output.stdout).trim(), "found tmux");

        Ok(Self {
            socket: socket.into(),
            config_file: None,
            panes: Mutex::new(HashMap::new()),
        })
    }

    /// Start the server with this config file instead of `~/.tmux.conf`.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Socket name this backend talks to.
    pub fn socket(&self) -> &str {
        &self.socket
    }

    /// Shell command a user runs to attach to one of our sessions.
    pub fn attach_command(&self, session: &str) -> String {
        self.attach_argv(session).join(" ")
    }

    fn attach_argv(&self, session: &str) -> Vec<String> {
        ["tmux", "-L", &self.socket, "attach", "-t", session]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Attach the calling terminal to `session` until the client detaches.
    ///
    /// Blocks; the caller must have released the terminal first.
    pub fn attach(&self, session: &str) -> Result<()> {
        let argv = self.attach_argv(session);
        debug!(?argv, "attaching to session");
        let status = Command::new(&argv[0])
            .args(&argv[1..])
            // An outer tmux would refuse a nested client
            .env_remove("TMUX")
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        if !status.success() {
            return Err(Error::Multiplexer {
                command: "attach".to_string(),
                stderr: format!("client exited with {}", status),
            });
        }
        Ok(())
    }

    /// Stop the private server, disconnecting every client.
    pub fn kill_server(&self) -> Result<()> {
        match self.run(&["kill-server"]) {
            Ok(_) | Err(Error::PaneNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        if let Ok(mut panes) = self.panes.lock() {
            panes.clear();
        }
        Ok(())
    }

    /// Run a tmux subcommand and return its stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("tmux");
        cmd.args(["-L", &self.socket]);
        if let Some(ref conf) = self.config_file {
            cmd.arg("-f").arg(conf);
        }
        cmd.args(args);
        debug!(socket = %self.socket, ?args, "tmux");

        let output = cmd.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::BackendUnavailable("tmux binary disappeared from PATH".to_string())
            } else {
                Error::Io(e)
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(classify_failure(args, stderr))
        }
    }

    fn register(&self, pane_id: &str) {
        if let Ok(mut panes) = self.panes.lock() {
            panes.insert(pane_id.to_string(), None);
        }
    }

    /// Look up (and cache) the tty device behind a pane.
    fn pane_tty(&self, pane: &PaneHandle) -> Result<PathBuf> {
        if let Ok(panes) = self.panes.lock() {
            if let Some(Some(tty)) = panes.get(pane.id()) {
                return Ok(tty.clone());
            }
        }

        let tty = self
            .run(&["display-message", "-p", "-t", pane.id(), "#{pane_tty}"])?
            .trim()
            .to_string();
        if tty.is_empty() {
            return Err(Error::PaneNotFound {
                pane: pane.to_string(),
            });
        }

        let tty = PathBuf::from(tty);
        if let Ok(mut panes) = self.panes.lock() {
            panes.insert(pane.id().to_string(), Some(tty.clone()));
        }
        Ok(tty)
    }

    fn session_args(options: &SessionOptions, args: &mut Vec<String>) {
        if let Some(ref dir) = options.cwd {
            args.push("-c".to_string());
            args.push(dir.display().to_string());
        }
        for (key, value) in &options.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
    }
}

/// Escape literal text for `send-keys -l`.
///
/// tmux treats an argument ending in `;` as a command separator and drops
/// the semicolon; `\;` at the end of an argument stands for a literal one.
fn literal_arg(text: &str) -> String {
    match text.strip_suffix(';') {
        Some(head) => format!("{}\\;", head),
        None => text.to_string(),
    }
}

/// Map a tmux failure onto the error taxonomy.
fn classify_failure(args: &[&str], stderr: String) -> Error {
    let target = args
        .iter()
        .position(|a| *a == "-t")
        .and_then(|i| args.get(i + 1))
        .map(|t| t.to_string())
        .unwrap_or_default();

    if GONE_MARKERS.iter().any(|m| stderr.contains(m)) {
        return Error::PaneNotFound { pane: target };
    }
    let command = args.first().copied().unwrap_or_default();
    if command == "split-window" && NO_SPACE_MARKERS.iter().any(|m| stderr.contains(m)) {
        return Error::PaneCreationFailed { reason: stderr };
    }
    Error::Multiplexer {
        command: command.to_string(),
        stderr,
    }
}

impl SessionBackend for TmuxBackend {
    fn name(&self) -> &'static str {
        "tmux"
    }

    fn create_session(&self, name: &str, options: &SessionOptions) -> Result<SessionHandle> {
        let mut args: Vec<String> = ["new-session", "-d", "-s", name, "-P", "-F", "#{pane_id}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if options.width > 0 && options.height > 0 {
            args.extend([
                "-x".to_string(),
                options.width.to_string(),
                "-y".to_string(),
                options.height.to_string(),
            ]);
        }
        Self::session_args(options, &mut args);
        if let Some(ref command) = options.command {
            args.push(command.clone());
        }

        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let pane_id = self.run(&refs)?.trim().to_string();
        self.register(&pane_id);

        Ok(SessionHandle {
            name: name.to_string(),
            main_pane: PaneHandle::new(pane_id, name),
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
                let direction = if matches!(layout, Layout::Right { .. }) {
                    "-h"
                } else {
                    "-v"
                };
                let percent = (*percent).clamp(10, 90).to_string();
                let mut args: Vec<String> = [
                    "split-window",
                    "-d",
                    direction,
                    "-p",
                    percent.as_str(),
                    "-t",
                    session.main_pane.id(),
                    "-P",
                    "-F",
                    "#{pane_id}",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect();
                Self::session_args(options, &mut args);
                if let Some(ref command) = options.command {
                    args.push(command.clone());
                }

                let refs: Vec<&str> = args.iter().map(String::as_str).collect();
                let pane_id = self.run(&refs)?.trim().to_string();
                self.register(&pane_id);
                Ok(PaneHandle::new(pane_id, session.name.clone()))
            }
        }
    }

    fn send_keys(&self, pane: &PaneHandle, text: &str) -> Result<()> {
        // -l sends the text literally, so key names inside it are not expanded
        let literal = literal_arg(text);
        self.run(&["send-keys", "-t", pane.id(), "-l", "--", &literal])?;
        Ok(())
    }

    fn send_key(&self, pane: &PaneHandle, key: &Key) -> Result<()> {
        self.run(&["send-keys", "-t", pane.id(), key.tmux_name()])?;
        Ok(())
    }

    fn write_output(&self, pane: &PaneHandle, text: &str) -> Result<()> {
        let tty = self.pane_tty(pane)?;
        let mut device = OpenOptions::new().write(true).open(&tty).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::PaneNotFound {
                    pane: pane.to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        device.write_all(text.as_bytes())?;
        device.flush()?;
        Ok(())
    }

    fn capture_buffer(&self, pane: &PaneHandle) -> Result<String> {
        self.run(&["capture-pane", "-p", "-J", "-S", "-", "-t", pane.id()])
    }

    fn set_title(&self, pane: &PaneHandle, title: &str) -> Result<()> {
        self.run(&["select-pane", "-t", pane.id(), "-T", title])?;
        Ok(())
    }

    fn kill_session(&self, session: &str) -> Result<()> {
        let panes = self.run(&["list-panes", "-s", "-t", session, "-F", "#{pane_id}"]);
        self.run(&["kill-session", "-t", session])?;

        if let (Ok(listing), Ok(mut registry)) = (panes, self.panes.lock()) {
            for id in listing.lines() {
                registry.remove(id.trim());
            }
        }
        Ok(())
    }

    fn has_session(&self, name: &str) -> bool {
        // `=` asks for an exact match instead of a prefix
        let target = format!("={}", name);
        self.run(&["has-session", "-t", &target]).is_ok()
    }
}
