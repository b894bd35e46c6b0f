//! Configuration management.
//!
//! Loaded from `<config_dir>/termstage/config.toml`. Every field has a
//! default, so a missing file or a partial file both work.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that forces instant typing (rehearsals, CI).
pub const SPEEDY_ENV: &str = "TERMSTAGE_SPEEDY";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub typing: TypingConfig,
    pub session: SessionConfig,
    pub viewer: ViewerConfig,
    pub theme: ThemeConfig,
}

/// Unit of a single simulated keystroke write.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Char,
    Word,
}

/// Typing cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypingConfig {
    /// Shortest pause before a keystroke
    pub min_delay_ms: u64,
    /// Longest pause before a keystroke
    pub max_delay_ms: u64,
    /// Upper bound of the extra pause after a word boundary
    pub word_delay_ms: u64,
    pub granularity: Granularity,
    /// Probability (0.0-1.0) of typing a wrong letter and backspacing it
    pub typo_rate: f64,
    /// Disable all typing delays
    pub speedy: bool,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 20,
            max_delay_ms: 90,
            word_delay_ms: 120,
            granularity: Granularity::Char,
            typo_rate: 0.0,
            speedy: false,
        }
    }
}

/// Where the speaker pane goes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerLayout {
    /// A separate session the audience is never attached to
    #[default]
    Session,
    /// Split to the right of the audience pane (rehearsal only)
    Right,
    /// Split below the audience pane (rehearsal only)
    Below,
}

/// Multiplexer session setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Private tmux socket name (`tmux -L`)
    pub socket: String,
    pub width: u16,
    pub height: u16,
    /// Shell started in the audience pane
    pub shell: String,
    pub speaker_layout: SpeakerLayout,
    /// Size of a split speaker pane, in percent
    pub speaker_percent: u8,
    /// Start the audience shell in a temporary HOME with demo dotfiles
    pub isolated_home: bool,
    /// Press Enter after a chapter banner so a fresh prompt appears under it
    pub fresh_prompt_after_chapter: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            socket: "termstage".to_string(),
            width: 120,
            height: 36,
            shell: "bash".to_string(),
            speaker_layout: SpeakerLayout::Session,
            speaker_percent: 35,
            isolated_home: true,
            fresh_prompt_after_chapter: true,
        }
    }
}

/// External renderers for display steps. `{path}` is replaced by the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub image: Vec<String>,
    pub markdown: Vec<String>,
    /// Seconds before a renderer is killed
    pub timeout_secs: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            image: vec!["img2txt".to_string(), "{path}".to_string()],
            markdown: vec![
                "glow".to_string(),
                "-s".to_string(),
                "dark".to_string(),
                "{path}".to_string(),
            ],
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    /// One of `default`, `classic`, `ocean`
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, applying env overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific file; a missing file yields defaults.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Path of the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("termstage").join("config.toml"))
    }

    /// Directory for the log file.
    pub fn state_dir() -> Result<PathBuf> {
        let dir = dirs::state_dir()
            .or_else(dirs::cache_dir)
            .context("Could not determine state directory")?;
        Ok(dir.join("termstage"))
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(SPEEDY_ENV) {
            if is_truthy(&value) {
                self.typing.speedy = true;
            }
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
