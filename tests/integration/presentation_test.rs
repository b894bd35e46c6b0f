//! Integration tests for the presentation controller

use std::sync::Arc;
use std::time::Duration;

use super::helpers::Stage;
use termstage::backend::{Key, MemoryEvent};
use termstage::signals::{self, Signal};
use termstage::viewer::Renderer;
use termstage::{DisplayContent, Error, Outcome, Script, Status};

fn intro_script() -> Script {
    Script::builder()
        .chapter("Intro")
        .note("remember to breathe")
        .cmd("echo hi")
        .wait()
        .build()
        .unwrap()
}

fn advance_until_done(stage: &Stage, script: Script) -> Status {
    let (_tx, rx) = signals::channel();
    let mut presentation = stage.present(script);
    presentation.start().unwrap();
    while !presentation.status().is_terminal() {
        presentation.advance(rx.flags()).unwrap();
    }
    presentation.status()
}

#[test]
fn four_advances_hold_at_pause_and_fifth_finishes() {
    let stage = Stage::new();
    let (_tx, rx) = signals::channel();
    let mut presentation = stage.present(intro_script());

    presentation.start().unwrap();
    assert_eq!(presentation.status(), Status::AwaitingAdvance { cursor: 0 });
    for _ in 0..4 {
        presentation.advance(rx.flags()).unwrap();
    }

    let audience = stage.audience();
    assert!(audience.contains("Intro"));
    assert!(audience.contains("echo hi"));
    assert!(audience.contains("\nhi\n"), "missing command output: {:?}", audience);
    assert!(!audience.contains("remember to breathe"));
    assert_eq!(presentation.status(), Status::AwaitingAdvance { cursor: 3 });

    assert_eq!(presentation.advance(rx.flags()).unwrap(), Status::Finished);
}

#[test]
fn every_step_is_visited_once_in_order() {
    let stage = Stage::new();
    let script = Script::builder()
        .cmd("echo one")
        .note("between")
        .cmd("echo two")
        .chapter("Part 2")
        .cmd("echo three")
        .build()
        .unwrap();

    assert_eq!(advance_until_done(&stage, script), Status::Finished);
    assert_eq!(stage.executed(), vec!["echo one", "echo two", "echo three"]);

    let speaker = stage.speaker();
    let one = speaker.find("$ echo one").unwrap();
    let between = speaker.find("between").unwrap();
    let two = speaker.find("$ echo two").unwrap();
    let part = speaker.find("== Part 2 ==").unwrap();
    let three = speaker.find("$ echo three").unwrap();
    assert!(one < between && between < two && two < part && part < three);
}

#[test]
fn notes_never_reach_the_audience_even_when_skipping() {
    let stage = Stage::new();
    let (tx, rx) = signals::channel();
    stage.clock.signal_on_sleep(2, tx.clone(), Signal::Skip);
    let script = Script::builder()
        .note("the password is hunter2")
        .cmd("echo public")
        .note("second secret")
        .wait_for("private hint")
        .build()
        .unwrap();

    for _ in 0..5 {
        tx.send(Signal::Advance);
    }
    let outcome = stage.present(script).run(&rx).unwrap();

    assert_eq!(outcome, Outcome::Completed);
    let audience = stage.audience();
    for secret in ["hunter2", "second secret", "private hint"] {
        assert!(!audience.contains(secret), "{} leaked to audience", secret);
        assert!(stage.speaker().contains(secret));
    }
    assert_eq!(stage.executed(), vec!["echo public"]);
}

#[test]
fn skip_flushes_the_rest_before_enter() {
    let stage = Stage::new();
    let (tx, rx) = signals::channel();
    stage.clock.signal_on_sleep(3, tx.clone(), Signal::Skip);
    let command = "echo flushed in one go";

    tx.send(Signal::Advance);
    let outcome = stage
        .present(Script::builder().cmd(command).build().unwrap())
        .run(&rx)
        .unwrap();
    assert_eq!(outcome, Outcome::Completed);

    let audience_id = stage.surfaces.audience.id().to_string();
    let mut typed = String::new();
    let mut enters = 0;
    for event in stage.backend.events() {
        match event {
            MemoryEvent::Keys { pane, text } if pane == audience_id => {
                assert_eq!(enters, 0, "text written after Enter");
                typed.push_str(&text);
            }
            MemoryEvent::Key { pane, key: Key::Enter } if pane == audience_id => {
                assert_eq!(typed, command, "Enter before the full text");
                enters += 1;
            }
            _ => {}
        }
    }
    assert_eq!(enters, 1);
    assert_eq!(stage.executed(), vec![command]);
}

#[test]
fn advance_while_typing_acts_as_skip() {
    let stage = Stage::new();
    let (tx, rx) = signals::channel();
    stage.clock.signal_on_sleep(2, tx.clone(), Signal::Advance);

    tx.send(Signal::Advance);
    let outcome = stage
        .present(Script::builder().cmd("echo impatient").build().unwrap())
        .run(&rx)
        .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(stage.executed(), vec!["echo impatient"]);
    // One char, then the rest in a single write
    let writes = stage
        .backend
        .events()
        .into_iter()
        .filter(|e| matches!(e, MemoryEvent::Keys { .. }))
        .count();
    assert_eq!(writes, 2);
}

#[test]
fn abort_mid_typing_never_executes_the_command() {
    let stage = Stage::new();
    let (tx, rx) = signals::channel();
    let command = "echo this command is exactly fifty characters long";
    assert_eq!(command.len(), 50);
    stage.clock.signal_on_sleep(10, tx.clone(), Signal::Abort);

    tx.send(Signal::Advance);
    let mut presentation = stage.present(Script::builder().cmd(command).build().unwrap());
    let outcome = presentation.run(&rx).unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(presentation.status(), Status::Finished);
    assert!(stage.executed().is_empty());
    assert!(stage.audience().starts_with("echo this"));
    assert!(!stage.audience().contains(command));
    assert!(!stage.backend.is_alive(&stage.surfaces.audience));
    assert!(!stage.backend.is_alive(&stage.surfaces.speaker));
}

#[test]
fn abort_while_waiting_is_a_clean_stop() {
    let stage = Stage::new();
    let (tx, rx) = signals::channel();
    let mut presentation = stage.present(intro_script());
    presentation.start().unwrap();
    presentation.advance(rx.flags()).unwrap();

    tx.send(Signal::Abort);
    assert_eq!(presentation.advance(rx.flags()).unwrap(), Status::Finished);
    assert!(stage.audience().contains("Intro"));
    assert!(!stage.speaker().contains("remember to breathe"));
    assert!(stage.executed().is_empty());
    assert!(!stage.backend.is_alive(&stage.surfaces.audience));
}

#[test]
fn pane_lost_at_step_three_fails_with_cursor_two() {
    let stage = Stage::new();
    let (_tx, rx) = signals::channel();
    stage.backend.fail_when_written("echo two");
    let script = Script::builder()
        .chapter("Setup")
        .cmd("echo one")
        .cmd("echo two")
        .cmd("echo three")
        .cmd("echo four")
        .build()
        .unwrap();
    let mut presentation = stage.present(script);
    presentation.start().unwrap();

    presentation.advance(rx.flags()).unwrap();
    presentation.advance(rx.flags()).unwrap();
    let err = presentation.advance(rx.flags()).unwrap_err();

    let failure = err.run_failure().expect("run failure");
    assert_eq!(failure.step, 2);
    assert_eq!(failure.cursor, 2);
    assert!(matches!(failure.error, Error::PaneNotFound { .. }));
    assert_eq!(presentation.status(), Status::Failed { step: 2, cursor: 2 });

    // Failed is terminal: nothing else is rendered
    assert_eq!(
        presentation.advance(rx.flags()).unwrap(),
        Status::Failed { step: 2, cursor: 2 }
    );
    assert_eq!(stage.executed(), vec!["echo one"]);
    assert!(!stage.audience().contains("three"));
    assert!(!stage.speaker().contains("three"));
    assert!(!stage.backend.is_alive(&stage.surfaces.speaker));
}

#[test]
fn run_reports_failure_with_step_index() {
    let stage = Stage::new();
    let (tx, rx) = signals::channel();
    stage.backend.fail_when_written("boom");
    for _ in 0..3 {
        tx.send(Signal::Advance);
    }

    let err = stage
        .present(Script::builder().cmd("true").cmd("echo boom").build().unwrap())
        .run(&rx)
        .unwrap_err();
    assert!(err.to_string().contains("step 2"), "{}", err);
}

#[test]
fn finished_is_absorbing() {
    let stage = Stage::new();
    let (_tx, rx) = signals::channel();
    let mut presentation = stage.present(Script::builder().cmd("echo once").build().unwrap());
    presentation.start().unwrap();
    assert_eq!(presentation.advance(rx.flags()).unwrap(), Status::Finished);

    let events = stage.backend.events().len();
    for _ in 0..3 {
        assert_eq!(presentation.advance(rx.flags()).unwrap(), Status::Finished);
    }
    assert_eq!(stage.backend.events().len(), events);
    assert_eq!(presentation.abort(), Status::Finished);
}

#[test]
fn running_twice_is_an_authoring_error() {
    let stage = Stage::new();
    let (tx, rx) = signals::channel();
    tx.send(Signal::Advance);

    let mut presentation = stage.present(Script::builder().note("only").build().unwrap());
    assert_eq!(presentation.run(&rx).unwrap(), Outcome::Completed);
    let err = presentation.run(&rx).unwrap_err();
    assert!(matches!(err, Error::Authoring(_)));
}

#[test]
fn empty_script_is_rejected_at_start() {
    let stage = Stage::new();
    let err = stage.present(Script::default()).start().unwrap_err();
    assert!(matches!(err, Error::Authoring(_)));
}

struct BrokenViewer;

impl Renderer for BrokenViewer {
    fn render(&self, _content: &DisplayContent) -> termstage::Result<String> {
        Err(Error::DisplayRenderFailed {
            program: "img2txt".to_string(),
            status: "exit code 1".to_string(),
            stderr: "unsupported format".to_string(),
        })
    }
}

#[test]
fn failed_display_is_reported_and_playback_continues() {
    let stage = Stage::new();
    let (_tx, rx) = signals::channel();
    let script = Script::builder()
        .display(DisplayContent::Image("tux.png".into()))
        .cmd("echo after")
        .build()
        .unwrap();
    let mut presentation = stage.present(script).with_renderer(Arc::new(BrokenViewer));
    presentation.start().unwrap();

    assert_eq!(
        presentation.advance(rx.flags()).unwrap(),
        Status::AwaitingAdvance { cursor: 1 }
    );
    assert!(stage.speaker().contains("unsupported format"));
    assert_eq!(presentation.advance(rx.flags()).unwrap(), Status::Finished);
    assert_eq!(stage.executed(), vec!["echo after"]);
}

#[test]
fn display_text_is_written_without_typing() {
    let stage = Stage::new();
    let script = Script::builder()
        .display(DisplayContent::Text("line one\nline two".to_string()))
        .build()
        .unwrap();

    advance_until_done(&stage, script);
    assert!(stage.audience().contains("line one\r\nline two\r\n"));
    assert!(stage.clock.sleeps().is_empty());
    assert!(stage.speaker().contains("text: line one (+1 more lines)"));
}

#[test]
fn keys_and_sleep_steps() {
    let stage = Stage::new();
    let script = Script::builder()
        .keys([Key::Named("C-l".to_string()), Key::Enter])
        .sleep(Duration::from_millis(120))
        .build()
        .unwrap();

    advance_until_done(&stage, script);
    let audience_id = stage.surfaces.audience.id().to_string();
    let keys: Vec<Key> = stage
        .backend
        .events()
        .into_iter()
        .filter_map(|e| match e {
            MemoryEvent::Key { pane, key } if pane == audience_id => Some(key),
            _ => None,
        })
        .collect();
    assert_eq!(keys, vec![Key::Named("C-l".to_string()), Key::Enter]);
    assert_eq!(
        stage.clock.sleeps().iter().sum::<Duration>(),
        Duration::from_millis(120)
    );
    assert!(stage.speaker().contains("keys: C-l Enter"));
}

#[test]
fn chapter_sets_the_audience_title() {
    let stage = Stage::new();
    advance_until_done(&stage, Script::builder().chapter("Intro").build().unwrap());
    assert_eq!(
        stage.backend.title(&stage.surfaces.audience).as_deref(),
        Some("Intro")
    );
}

#[test]
fn status_hook_sees_every_transition() {
    let stage = Stage::new();
    let (_tx, rx) = signals::channel();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut presentation = stage
        .present(Script::builder().cmd("echo hi").build().unwrap())
        .on_status(move |status| sink.lock().unwrap().push(*status));

    presentation.start().unwrap();
    presentation.advance(rx.flags()).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Status::AwaitingAdvance { cursor: 0 },
            Status::Rendering { cursor: 0 },
            Status::Finished,
        ]
    );
}

#[test]
fn typed_raw_text_is_left_at_the_prompt() {
    let stage = Stage::new();
    let script = Script::builder().raw_typed("git status").build().unwrap();

    advance_until_done(&stage, script);
    assert!(stage.audience().contains("git status"));
    assert!(stage.executed().is_empty());
    assert!(!stage.clock.sleeps().is_empty());
    assert!(stage.speaker().contains("raw: git status"));

    let audience_id = stage.surfaces.audience.id().to_string();
    let pressed_enter = stage.backend.events().into_iter().any(|e| {
        matches!(e, MemoryEvent::Key { pane, key: Key::Enter } if pane == audience_id)
    });
    assert!(!pressed_enter);
}

#[test]
fn raw_text_runs_only_its_complete_lines() {
    let stage = Stage::new();
    let script = Script::builder()
        .raw("echo first\necho sec")
        .build()
        .unwrap();

    advance_until_done(&stage, script);
    assert_eq!(stage.executed(), vec!["echo first"]);
    assert!(stage.clock.sleeps().is_empty());
    assert!(stage.speaker().contains("raw: echo first (+1 more lines)"));
}

#[test]
fn multi_line_command_never_reaches_a_pane() {
    let err = Script::builder()
        .cmd("echo one\necho two")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Authoring(_)));
    assert!(err.to_string().contains("several lines"));
}
