//! `termstage run` - present a script.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use termstage::backend::{session_name, MemoryBackend, SessionBackend, SessionOptions, TmuxBackend};
use termstage::cli::RunArgs;
use termstage::console::{self, ConsoleView, RawTerminal, TmuxControl};
use termstage::script::ScriptFile;
use termstage::signals;
use termstage::theme::Theme;
use termstage::typing::{TypingOptions, Typist};
use termstage::viewer::ExternalViewer;
use termstage::workdir::{plain_session_options, Workdir};
use termstage::{Config, Outcome, Presentation, Script, Surfaces};

use super::script_base_dir;

const FINAL_KEY_POLL: Duration = Duration::from_millis(100);

/// Everything needed to build a presentation, independent of the backend.
struct Prepared {
    config: Config,
    file: ScriptFile,
    script: Script,
    title: String,
    theme: Theme,
}

impl Prepared {
    fn load(args: &RunArgs) -> Result<Self> {
        let mut config = Config::load()?;
        if args.speedy || args.dry_run {
            config.typing.speedy = true;
        }

        let file = ScriptFile::load(&args.script)
            .with_context(|| format!("Failed to read script {}", args.script.display()))?;
        let script = file
            .to_script(&script_base_dir(&args.script))
            .with_context(|| format!("Invalid script {}", args.script.display()))?;
        let title = args
            .name
            .clone()
            .or_else(|| file.title.clone())
            .unwrap_or_else(|| file_stem(&args.script));
        let theme = Theme::by_name(&config.theme.name);

        Ok(Self {
            config,
            file,
            script,
            title,
            theme,
        })
    }

    fn typist(&self, seed: Option<u64>) -> Typist {
        let typist = Typist::new(TypingOptions::from(&self.config.typing));
        match seed {
            Some(seed) => typist.with_seed(seed),
            None => typist,
        }
    }

    fn presentation(
        &self,
        backend: Arc<dyn SessionBackend>,
        surfaces: Surfaces,
        seed: Option<u64>,
    ) -> Presentation {
        Presentation::new(self.script.clone(), backend, surfaces)
            .with_typist(self.typist(seed))
            .with_renderer(Arc::new(ExternalViewer::new(self.config.viewer.clone())))
            .with_theme(self.theme.clone())
            .with_fresh_prompt(self.config.session.fresh_prompt_after_chapter)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "presentation".to_string())
}

pub fn handle(args: &RunArgs) -> Result<()> {
    let prepared = Prepared::load(args)?;
    if args.dry_run {
        return dry_run(&prepared, args.seed);
    }

    if !atty::is(atty::Stream::Stdin) || !atty::is(atty::Stream::Stdout) {
        anyhow::bail!("termstage run needs an interactive terminal (try --dry-run)");
    }

    let name = session_name(&prepared.title);
    let session_config = &prepared.config.session;
    let base = script_base_dir(&args.script);

    let workdir = if session_config.isolated_home {
        Some(Workdir::create(&prepared.file.media_paths(&base))?)
    } else {
        None
    };
    let mut tmux = TmuxBackend::new(session_config.socket.clone())?;
    let audience_options = match &workdir {
        Some(workdir) => {
            tmux = tmux.with_config_file(workdir.tmux_conf());
            workdir.session_options(session_config)
        }
        None => plain_session_options(session_config, Some(&base)),
    };
    let tmux = Arc::new(tmux);
    let backend: Arc<dyn SessionBackend> = tmux.clone();

    for session in Surfaces::clear_stale(backend.as_ref(), &name)? {
        eprintln!(
            "{}",
            prepared
                .theme
                .secondary_text(&format!("Replaced leftover session {}", session))
        );
    }
    let surfaces = Surfaces::open(backend.as_ref(), &name, session_config, &audience_options)?;
    let mut attach = vec![format!(
        "audience: {}",
        tmux.attach_command(surfaces.audience.session())
    )];
    if surfaces.speaker.session() != surfaces.audience.session() {
        attach.push(format!(
            "speaker:  {}",
            tmux.attach_command(surfaces.speaker.session())
        ));
    }

    let control = TmuxControl {
        backend: tmux.clone(),
        session: surfaces.audience.session().to_string(),
    };
    let steps = prepared.script.iter().map(|s| s.to_string()).collect();
    let view = ConsoleView::new(&prepared.title, steps, attach, prepared.theme.clone()).shared();

    let (sender, signals) = signals::channel();
    register_os_signals(signals.flags().abort_flag())?;

    let hook_view = view.clone();
    let mut presentation = prepared
        .presentation(backend, surfaces, args.seed)
        .on_status(move |status| console::show_status(&hook_view, *status));

    let terminal = RawTerminal::enter()?;
    console::redraw(&view);
    let stop = Arc::new(AtomicBool::new(false));
    let listener = console::spawn_listener(sender, view.clone(), stop.clone(), Some(control));

    let result = presentation.run(&signals);
    if matches!(result, Ok(Outcome::Completed)) {
        // Leave the last output on screen until the presenter closes
        let _ = signals.wait(FINAL_KEY_POLL);
    }

    stop.store(true, Ordering::SeqCst);
    let _ = listener.join();
    presentation.teardown();
    drop(terminal);
    drop(workdir);

    match result? {
        Outcome::Completed => println!("{}", prepared.theme.success_text("Presentation complete.")),
        Outcome::Aborted => println!("{}", prepared.theme.primary_text("Presentation stopped.")),
    }
    Ok(())
}

/// Abort on SIGINT, SIGTERM and SIGHUP.
///
/// In raw mode Ctrl-C arrives as a key; the handlers cover the moments
/// outside raw mode and signals sent by other processes.
fn register_os_signals(abort: Arc<AtomicBool>) -> Result<()> {
    let flag = abort.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGHUP, SIGTERM};
        signal_hook::flag::register(SIGTERM, abort.clone())?;
        signal_hook::flag::register(SIGHUP, abort)?;
    }
    Ok(())
}

/// Replay every step against the in-memory backend and print both surfaces.
fn dry_run(prepared: &Prepared, seed: Option<u64>) -> Result<()> {
    let memory = Arc::new(MemoryBackend::new());
    let backend: Arc<dyn SessionBackend> = memory.clone();
    let name = session_name(&prepared.title);
    let surfaces = Surfaces::open(
        backend.as_ref(),
        &name,
        &prepared.config.session,
        &SessionOptions::default(),
    )?;
    let (audience, speaker) = (surfaces.audience.clone(), surfaces.speaker.clone());

    let (_sender, signals) = signals::channel();
    let mut presentation = prepared.presentation(backend, surfaces, seed);
    presentation.start()?;
    while !presentation.status().is_terminal() {
        presentation.advance(signals.flags())?;
    }

    let theme = &prepared.theme;
    println!("{}", theme.accent_bold_text("── audience ──"));
    print!("{}", memory.transcript(&audience).replace("\r\n", "\n"));
    println!();
    println!("{}", theme.accent_bold_text("── speaker ──"));
    print!("{}", memory.transcript(&speaker).replace("\r\n", "\n"));
    presentation.teardown();
    Ok(())
}
