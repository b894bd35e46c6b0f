//! Script files.
//!
//! A script file is a TOML serialization of the authoring calls:
//!
//! ```toml
//! title = "showing off"
//! media = ["tux.png"]
//!
//! [[step]]
//! chapter = "Intro"
//!
//! [[step]]
//! note = "remember to breathe"
//!
//! [[step]]
//! cmd = "echo hi"
//!
//! [[step]]
//! display = { image = "tux.png" }
//!
//! [[step]]
//! wait = "next: the fancy part"
//!
//! [[step]]
//! keys = ["C-x", "C-s"]
//!
//! [[step]]
//! raw_typed = "int main(void) {\n"
//!
//! [[step]]
//! sleep_ms = 500
//! ```

use super::{DisplayContent, Script, ScriptBuilder};
use crate::backend::Key;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parsed contents of a script file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptFile {
    /// Presentation title (also used for the session name)
    pub title: Option<String>,
    /// Files copied into the presentation's working directory
    #[serde(default)]
    pub media: Vec<PathBuf>,
    #[serde(default, rename = "step")]
    pub steps: Vec<StepSpec>,
}

/// One `[[step]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum StepSpec {
    Chapter(String),
    Note(String),
    Cmd(String),
    Display(DisplaySpec),
    /// Pause; an empty string means no hint
    Wait(String),
    Keys(Vec<String>),
    /// Literal input sent in one write
    Raw(String),
    /// Literal input typed with human cadence
    RawTyped(String),
    SleepMs(u64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum DisplaySpec {
    Text(String),
    Image(PathBuf),
    Markdown(PathBuf),
}

impl ScriptFile {
    /// Parse a script from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Authoring(format!("invalid script: {}", e)))
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Replay the file's steps through the authoring API.
    ///
    /// Media paths are resolved relative to `base_dir` when they are relative.
    pub fn to_script(&self, base_dir: &Path) -> Result<Script> {
        let mut builder = ScriptBuilder::default();
        for spec in &self.steps {
            spec.append_to(&mut builder, base_dir)?;
        }
        builder.build()
    }

    /// Media paths, resolved the same way as display paths.
    pub fn media_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.media.iter().map(|p| resolve(base_dir, p)).collect()
    }
}

impl StepSpec {
    fn append_to(&self, builder: &mut ScriptBuilder, base_dir: &Path) -> Result<()> {
        match self {
            Self::Chapter(title) => builder.chapter(title.clone()),
            Self::Note(text) => builder.note(text.clone()),
            Self::Cmd(text) => builder.cmd(text.clone()),
            Self::Display(spec) => builder.display(match spec {
                DisplaySpec::Text(text) => DisplayContent::Text(text.clone()),
                DisplaySpec::Image(path) => DisplayContent::Image(resolve(base_dir, path)),
                DisplaySpec::Markdown(path) => DisplayContent::Markdown(resolve(base_dir, path)),
            }),
            Self::Wait(hint) if hint.trim().is_empty() => builder.wait(),
            Self::Wait(hint) => builder.wait_for(hint.clone()),
            Self::Keys(names) => {
                let keys = names
                    .iter()
                    .map(|n| n.parse::<Key>())
                    .collect::<Result<Vec<_>>>()?;
                builder.keys(keys)
            }
            Self::Raw(text) => builder.raw(text.clone()),
            Self::RawTyped(text) => builder.raw_typed(text.clone()),
            Self::SleepMs(ms) => builder.sleep(Duration::from_millis(*ms)),
        };
        Ok(())
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
