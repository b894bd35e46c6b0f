//! Integration tests for loading script files from disk

use std::fs;

use super::helpers::{fixtures_dir, temp_fixture, Stage};
use termstage::backend::Key;
use termstage::script::ScriptFile;
use termstage::signals;
use termstage::workdir::Workdir;
use termstage::{DisplayContent, Error, Status, Step};

#[test]
fn demo_fixture_loads_in_authoring_order() {
    let file = ScriptFile::load(&fixtures_dir().join("demo.toml")).unwrap();
    assert_eq!(file.title.as_deref(), Some("Shell Basics"));

    let script = file.to_script(&fixtures_dir()).unwrap();
    let steps: Vec<Step> = script.iter().cloned().collect();
    assert_eq!(
        steps,
        vec![
            Step::Chapter {
                title: "Intro".to_string()
            },
            Step::Note {
                text: "remember to breathe".to_string()
            },
            Step::Command {
                text: "echo hi".to_string()
            },
            Step::Display {
                content: DisplayContent::Text("a picture is worth a thousand words".to_string())
            },
            Step::Keys {
                keys: vec![Key::Named("C-l".to_string())]
            },
            Step::Pause {
                hint: Some("take questions".to_string())
            },
        ]
    );
}

#[test]
fn demo_fixture_plays_to_the_end() {
    let file = ScriptFile::load(&fixtures_dir().join("demo.toml")).unwrap();
    let script = file.to_script(&fixtures_dir()).unwrap();
    let stage = Stage::new();
    let (_tx, rx) = signals::channel();

    let mut presentation = stage.present(script);
    presentation.start().unwrap();
    let mut advances = 0;
    while !presentation.status().is_terminal() {
        presentation.advance(rx.flags()).unwrap();
        advances += 1;
    }

    // Six steps plus the advance that releases the final pause
    assert_eq!(advances, 7);
    assert_eq!(presentation.status(), Status::Finished);
    assert_eq!(stage.executed(), vec!["echo hi"]);
    assert!(stage.audience().contains("a picture is worth a thousand words"));
    assert!(!stage.audience().contains("take questions"));
}

#[test]
fn misspelled_step_key_is_an_authoring_error() {
    let err = ScriptFile::load(&fixtures_dir().join("invalid.toml")).unwrap_err();
    assert!(matches!(err, Error::Authoring(_)));
    assert!(err.to_string().contains("comand"));
}

#[test]
fn title_only_file_does_not_build() {
    let file = ScriptFile::load(&fixtures_dir().join("empty.toml")).unwrap();
    assert_eq!(file.title.as_deref(), Some("Nothing to see"));
    let err = file.to_script(&fixtures_dir()).unwrap_err();
    assert!(matches!(err, Error::Authoring(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ScriptFile::load(&fixtures_dir().join("nope.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn missing_media_stops_workdir_creation() {
    let file = ScriptFile::load(&fixtures_dir().join("missing_media.toml")).unwrap();
    let media = file.media_paths(&fixtures_dir());
    assert_eq!(media, vec![fixtures_dir().join("does-not-exist.png")]);

    let err = Workdir::create(&media).unwrap_err();
    assert!(matches!(err, Error::Authoring(_)));
    assert!(err.to_string().contains("does-not-exist.png"));
}

#[test]
fn media_is_copied_into_the_workdir() {
    let (dir, script_path) = temp_fixture("demo.toml");
    let picture = dir.path().join("tux.txt");
    fs::write(&picture, "(o_\n//\\\nV_/_\n").unwrap();
    let content = fs::read_to_string(&script_path).unwrap();
    fs::write(&script_path, format!("media = [\"tux.txt\"]\n{}", content)).unwrap();

    let file = ScriptFile::load(&script_path).unwrap();
    let workdir = Workdir::create(&file.media_paths(dir.path())).unwrap();

    let copied = workdir.path().join("tux.txt");
    assert_eq!(fs::read_to_string(copied).unwrap(), "(o_\n//\\\nV_/_\n");
    assert!(workdir.tmux_conf().exists());
}
