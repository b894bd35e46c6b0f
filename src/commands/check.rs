//! `termstage check` - validate a script file without tmux.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use termstage::script::ScriptFile;
use termstage::theme::Theme;
use termstage::{DisplayContent, Step};

use super::script_base_dir;

pub fn handle(path: &Path) -> Result<()> {
    let file = ScriptFile::load(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let base = script_base_dir(path);
    let script = file
        .to_script(&base)
        .with_context(|| format!("Invalid script {}", path.display()))?;
    let theme = Theme::default();

    let width = script.len().to_string().len();
    for (i, step) in script.iter().enumerate() {
        println!(
            "{} {}",
            theme.secondary_text(&format!("{:>width$}", i + 1, width = width)),
            step
        );
    }

    let missing = missing_files(script.iter(), file.media_paths(&base));
    for path in &missing {
        eprintln!(
            "{}",
            theme.error_text(&format!("missing file: {}", path.display()))
        );
    }
    if !missing.is_empty() {
        anyhow::bail!("{} referenced file(s) not found", missing.len());
    }

    let commands = script
        .iter()
        .filter(|s| matches!(s, Step::Command { .. }))
        .count();
    println!(
        "{}",
        theme.success_text(&format!(
            "{}: {} steps, {} commands",
            path.display(),
            script.len(),
            commands
        ))
    );
    Ok(())
}

/// Media and display files that do not exist on disk.
fn missing_files<'a>(steps: impl Iterator<Item = &'a Step>, media: Vec<PathBuf>) -> Vec<PathBuf> {
    let displayed = steps.filter_map(|step| match step {
        Step::Display {
            content: DisplayContent::Image(path) | DisplayContent::Markdown(path),
        } => Some(path.clone()),
        _ => None,
    });
    let mut seen = HashSet::new();
    media
        .into_iter()
        .chain(displayed)
        .filter(|p| !p.exists() && seen.insert(p.clone()))
        .collect()
}
