//! Isolated working directory for the audience shell.
//!
//! A temporary HOME holding a minimal `.bashrc` with a fixed prompt, a
//! `.tmux.conf` for the presentation's tmux server, and copies of the
//! script's media files. Removed when dropped.

use crate::backend::SessionOptions;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const BASHRC: &str = r#"# generated for a termstage presentation
PS1='\[\e[1;32m\]$\[\e[0m\] '
HISTCONTROL=ignoreboth
unset PROMPT_COMMAND
alias ls='ls --color=auto'
"#;

const TMUX_CONF: &str = r#"# generated for a termstage presentation
set -g status off
set -g mouse off
set -g history-limit 10000
set -g default-terminal "tmux-256color"
set -g escape-time 0
"#;

/// Temporary HOME for a presentation.
#[derive(Debug)]
pub struct Workdir {
    dir: TempDir,
}

impl Workdir {
    /// Create the directory, write the dotfiles and copy `media` into it.
    pub fn create(media: &[PathBuf]) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("termstage-").tempdir()?;
        fs::write(dir.path().join(".bashrc"), BASHRC)?;
        fs::write(dir.path().join(".tmux.conf"), TMUX_CONF)?;

        for source in media {
            let name = source.file_name().ok_or_else(|| {
                Error::Authoring(format!("media path has no file name: {}", source.display()))
            })?;
            if !source.is_file() {
                return Err(Error::Authoring(format!(
                    "media file not found: {}",
                    source.display()
                )));
            }
            fs::copy(source, dir.path().join(name))?;
        }
        debug!(path = %dir.path().display(), media = media.len(), "workdir created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Config file for the presentation's tmux server.
    pub fn tmux_conf(&self) -> PathBuf {
        self.dir.path().join(".tmux.conf")
    }

    /// Options for an audience shell that lives in this directory.
    pub fn session_options(&self, config: &SessionConfig) -> SessionOptions {
        let home = self.path().display().to_string();
        SessionOptions {
            cwd: Some(self.path().to_path_buf()),
            command: Some(config.shell.clone()),
            env: vec![
                ("HOME".to_string(), home.clone()),
                ("HISTFILE".to_string(), format!("{}/.history", home)),
            ],
            width: config.width,
            height: config.height,
        }
    }
}

/// Options for an audience shell started in the caller's own environment.
pub fn plain_session_options(config: &SessionConfig, cwd: Option<&Path>) -> SessionOptions {
    SessionOptions {
        cwd: cwd.map(Path::to_path_buf),
        command: Some(config.shell.clone()),
        env: Vec::new(),
        width: config.width,
        height: config.height,
    }
}
