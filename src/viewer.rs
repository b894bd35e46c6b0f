//! External renderers for display steps.
//!
//! Images and markdown slides are rendered to ANSI text by an external
//! program (`img2txt`, `glow`, ...) whose stdout is then written to the
//! audience pane. A non-zero exit is reported, never swallowed.

use crate::config::ViewerConfig;
use crate::error::{Error, Result};
use crate::script::DisplayContent;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Turns display content into text ready for a pane.
pub trait Renderer: Send + Sync {
    fn render(&self, content: &DisplayContent) -> Result<String>;
}

/// Renderer that shells out to configured viewer programs.
#[derive(Debug, Clone)]
pub struct ExternalViewer {
    config: ViewerConfig,
}

impl ExternalViewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    /// Substitute `{path}` into an argv template.
    ///
    /// The path is appended when the template does not mention it.
    pub fn command_line(template: &[String], path: &Path) -> Result<Vec<String>> {
        if template.is_empty() {
            return Err(Error::Authoring("viewer command is empty".to_string()));
        }
        let path = path.display().to_string();
        let mut argv: Vec<String> = template.iter().map(|a| a.replace("{path}", &path)).collect();
        if !template.iter().any(|a| a.contains("{path}")) {
            argv.push(path);
        }
        Ok(argv)
    }

    fn run(&self, argv: &[String]) -> Result<String> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Authoring("viewer command is empty".to_string()))?;
        debug!(%program, ?args, "running viewer");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::DisplayRenderFailed {
                program: program.clone(),
                status: "not started".to_string(),
                stderr: e.to_string(),
            })?;

        let timeout = Duration::from_secs(self.config.timeout_secs.max(1));
        match wait_with_timeout(&mut child, timeout) {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => Err(Error::render_failed(program, output.status, &output.stderr)),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(wait_failed(program, e, timeout))
            }
        }
    }
}

impl Renderer for ExternalViewer {
    fn render(&self, content: &DisplayContent) -> Result<String> {
        let (template, path) = match content {
            DisplayContent::Text(text) => return Ok(text.clone()),
            DisplayContent::Image(path) => (&self.config.image, path),
            DisplayContent::Markdown(path) => (&self.config.markdown, path),
        };
        if !path.exists() {
            return Err(Error::DisplayRenderFailed {
                program: template.first().cloned().unwrap_or_default(),
                status: "not started".to_string(),
                stderr: format!("file not found: {}", path.display()),
            });
        }
        let argv = Self::command_line(template, path)?;
        self.run(&argv)
    }
}

/// Wait for child process with timeout.
///
/// Polls since std::process has no native timeout support. Output pipes are
/// drained on helper threads so a large render cannot fill the pipe and stall
/// the viewer.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Output> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let start = Instant::now();
    let poll_interval = Duration::from_millis(20);

    loop {
        match child.try_wait()? {
            Some(status) => {
                return Ok(Output {
                    status,
                    stdout: collect(stdout),
                    stderr: collect(stderr),
                });
            }
            None => {
                if start.elapsed() >= timeout {
                    return Err(std::io::Error::new(
                        ErrorKind::TimedOut,
                        "Process timed out",
                    ));
                }
                thread::sleep(poll_interval);
            }
        }
    }
}

/// Report a viewer that could not be waited for.
fn wait_failed(program: &str, error: std::io::Error, timeout: Duration) -> Error {
    let (status, stderr) = match error.kind() {
        ErrorKind::TimedOut => (format!("timed out after {}s", timeout.as_secs()), String::new()),
        _ => ("wait failed".to_string(), error.to_string()),
    };
    Error::DisplayRenderFailed {
        program: program.to_string(),
        status,
        stderr,
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).ok();
        buf
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
