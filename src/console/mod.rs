//! Presenter console.
//!
//! The terminal `termstage run` is started from becomes the presenter's
//! remote: it shows what is on stage and what comes next, and turns key
//! presses into signals for the controller. The audience and speaker panes
//! live in tmux and are attached from other terminals.

mod help;
mod keyboard;

pub use help::{calc_help_start_col, calc_help_start_row, render_help, HELP_BOX_WIDTH, HELP_LINES};
pub use keyboard::{map_key, ConsoleAction};

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::backend::TmuxBackend;
use crate::presentation::Status;
use crate::signals::{Signal, SignalSender};
use crate::theme::{strip_ansi, Theme};

/// How often the listener thread checks whether it should stop.
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Everything the console draws.
#[derive(Debug, Clone)]
pub struct ConsoleView {
    title: String,
    steps: Vec<String>,
    attach: Vec<String>,
    status: Status,
    show_help: bool,
    theme: Theme,
}

/// Console view shared between the controller and the input thread.
pub type SharedView = Arc<Mutex<ConsoleView>>;

impl ConsoleView {
    /// `steps` are one-line descriptions, in script order. `attach` lists
    /// the commands that attach to the audience and speaker sessions.
    pub fn new(title: impl Into<String>, steps: Vec<String>, attach: Vec<String>, theme: Theme) -> Self {
        Self {
            title: title.into(),
            steps,
            attach,
            status: Status::Idle,
            show_help: false,
            theme,
        }
    }

    pub fn shared(self) -> SharedView {
        Arc::new(Mutex::new(self))
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn help_visible(&self) -> bool {
        self.show_help
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    fn step(&self, index: usize) -> Option<&str> {
        self.steps.get(index).map(String::as_str)
    }

    /// The step on stage right now and the one the next advance will run.
    pub fn now_and_next(&self) -> (Option<&str>, Option<&str>) {
        match self.status {
            Status::Rendering { cursor } => (self.step(cursor), self.step(cursor + 1)),
            Status::AwaitingAdvance { cursor } => {
                let now = cursor.checked_sub(1).and_then(|i| self.step(i));
                (now, self.step(cursor))
            }
            Status::Idle => (None, self.step(0)),
            Status::Finished => (None, None),
            Status::Failed { step, .. } => (self.step(step), None),
        }
    }

    /// Status bar, padded to `width` columns.
    pub fn status_line(&self, width: u16) -> String {
        let theme = &self.theme;
        let icon = match self.status {
            Status::Rendering { .. } => "▶",
            Status::Finished => "■",
            Status::Failed { .. } => "✗",
            _ => "⏸",
        };
        let label = match self.status {
            Status::Failed { .. } => theme.error_text(self.status.label()),
            Status::Finished => theme.success_text(self.status.label()),
            _ => theme.primary_text(self.status.label()),
        };

        let mut output = format!(" {} {} ", icon, label);
        if let Some(cursor) = self.status.cursor() {
            output.push_str(&theme.secondary_text("│ "));
            output.push_str(&theme.primary_text(&format!(
                "step {}/{} ",
                (cursor + 1).min(self.steps.len()),
                self.steps.len()
            )));
        }
        output.push_str(&theme.secondary_text("│ "));
        for (key, action) in [("n", "next"), ("s", "skip"), ("?", "help"), ("q", "quit")] {
            output.push_str(&theme.accent_text(key));
            output.push_str(&theme.secondary_text(&format!(":{} ", action)));
        }

        let visible = UnicodeWidthStr::width(strip_ansi(&output).as_str());
        output.push_str(&" ".repeat((width as usize).saturating_sub(visible)));
        output
    }

    /// Draw the whole console.
    pub fn render(&self, out: &mut impl Write, width: u16, height: u16) -> Result<()> {
        if self.show_help {
            return render_help(out, width, height, self.theme.accent);
        }
        let theme = &self.theme;
        let (now, next) = self.now_and_next();

        let mut lines = vec![theme.accent_bold_text(&self.title), String::new()];
        for command in &self.attach {
            lines.push(theme.secondary_text(command));
        }
        lines.push(String::new());
        lines.push(format!(
            "{} {}",
            theme.secondary_text("now: "),
            theme.primary_text(now.unwrap_or("-"))
        ));
        lines.push(format!(
            "{} {}",
            theme.secondary_text("next:"),
            theme.primary_text(next.unwrap_or("-"))
        ));

        queue!(out, Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            queue!(out, MoveTo(1, row as u16), Print(line))?;
        }
        queue!(
            out,
            MoveTo(0, height.saturating_sub(1)),
            Print(self.status_line(width))
        )?;
        out.flush()?;
        Ok(())
    }
}

fn lock(view: &SharedView) -> MutexGuard<'_, ConsoleView> {
    view.lock().unwrap_or_else(|e| e.into_inner())
}

/// Redraw the shared view on stdout.
pub fn redraw(view: &SharedView) {
    let (width, height) = terminal::size().unwrap_or((80, 24));
    let mut stdout = io::stdout();
    if let Err(e) = lock(view).render(&mut stdout, width, height) {
        debug!(error = %e, "console redraw failed");
    }
}

/// Record a controller status change and redraw.
pub fn show_status(view: &SharedView, status: Status) {
    lock(view).set_status(status);
    redraw(view);
}

fn take_terminal() -> Result<()> {
    terminal::enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, Hide)?;
    Ok(())
}

fn release_terminal() -> Result<()> {
    let screen = execute!(io::stdout(), LeaveAlternateScreen, Show);
    terminal::disable_raw_mode()?;
    screen?;
    Ok(())
}

/// Raw mode on the alternate screen, restored on drop.
pub struct RawTerminal;

impl RawTerminal {
    pub fn enter() -> Result<Self> {
        take_terminal()?;
        Ok(Self)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = release_terminal();
    }
}

/// The tmux server behind the presentation, for the attach and kill keys.
#[derive(Clone)]
pub struct TmuxControl {
    pub backend: Arc<TmuxBackend>,
    /// Session the attach key opens
    pub session: String,
}

impl TmuxControl {
    /// Give the terminal to a tmux client, then take it back and redraw.
    fn attach(&self, view: &SharedView) {
        if let Err(e) = release_terminal() {
            warn!(error = %e, "could not release terminal");
        }
        if let Err(e) = self.backend.attach(&self.session) {
            warn!(error = %e, session = %self.session, "tmux attach failed");
        }
        if let Err(e) = take_terminal() {
            warn!(error = %e, "could not restore console");
        }
        redraw(view);
    }
}

/// Read keys on a background thread and forward them as signals.
///
/// The thread exits when `stop` is set or the controller stops listening.
/// Without `tmux` the attach and kill keys do nothing.
pub fn spawn_listener(
    sender: SignalSender,
    view: SharedView,
    stop: Arc<AtomicBool>,
    tmux: Option<TmuxControl>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            match event::poll(INPUT_POLL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(error = %e, "console input failed");
                    break;
                }
            }
            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "console input failed");
                    break;
                }
            };
            match event {
                Event::Key(key) => {
                    let help_visible = lock(&view).help_visible();
                    match map_key(key, help_visible) {
                        ConsoleAction::Signal(signal) => {
                            debug!(?signal, "presenter key");
                            if !sender.send(signal) {
                                break;
                            }
                        }
                        ConsoleAction::ToggleHelp => {
                            lock(&view).toggle_help();
                            redraw(&view);
                        }
                        ConsoleAction::AttachTmux => match &tmux {
                            Some(tmux) => tmux.attach(&view),
                            None => debug!("no tmux session to attach"),
                        },
                        ConsoleAction::KillServer => {
                            if let Some(tmux) = &tmux {
                                if let Err(e) = tmux.backend.kill_server() {
                                    warn!(error = %e, "kill-server failed");
                                }
                            }
                            if !sender.send(Signal::Abort) {
                                break;
                            }
                        }
                        ConsoleAction::Ignore => {}
                    }
                }
                Event::Resize(..) => redraw(&view),
                _ => {}
            }
        }
    })
}
