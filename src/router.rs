//! Dual-surface routing.
//!
//! Maps each step kind to the surfaces it renders on and how. This table is
//! the only place that decides what the audience sees; the renderer executes
//! routes and never looks at the step kind again.
//!
//! | Step      | Audience              | Speaker              |
//! |-----------|-----------------------|----------------------|
//! | Chapter   | styled banner + title | echo title           |
//! | Note      | (never)               | note text            |
//! | Command   | typed, then executed  | echo command         |
//! | Display   | content rendered      | echo summary         |
//! | Pause     | (nothing)             | waiting indicator    |
//! | Keys      | keys pressed          | echo key names       |
//! | Raw       | input sent, no Enter  | echo first line      |
//! | Sleep     | (nothing)             | (nothing)            |

use crate::backend::Key;
use crate::script::{DisplayContent, Step};
use std::time::Duration;

/// Which pane a route renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Audience,
    Speaker,
}

/// How a route renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Full-width styled section heading; also becomes the pane title
    Banner(String),
    /// Simulated typing followed by Enter
    TypeAndExecute(String),
    /// Content written directly, no typing simulation
    Render(DisplayContent),
    /// Named key presses
    PressKeys(Vec<Key>),
    /// Literal input, typed with cadence when `paced`, never terminated
    Input { text: String, paced: bool },
    /// One line of context for the presenter
    Echo(String),
    /// Speaker note body
    NoteText(String),
    /// Hold indicator, with optional hint
    Waiting(Option<String>),
    /// Fixed delay
    Hold(Duration),
}

/// One (surface, mode) pair to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub surface: Surface,
    pub mode: RenderMode,
}

impl Route {
    fn audience(mode: RenderMode) -> Self {
        Self {
            surface: Surface::Audience,
            mode,
        }
    }

    fn speaker(mode: RenderMode) -> Self {
        Self {
            surface: Surface::Speaker,
            mode,
        }
    }
}

/// Ordered routes for a step.
///
/// Speaker context comes first so the presenter knows what is about to
/// happen while the audience pane is still being typed into.
pub fn route(step: &Step) -> Vec<Route> {
    match step {
        Step::Chapter { title } => vec![
            Route::speaker(RenderMode::Echo(format!("== {} ==", title))),
            Route::audience(RenderMode::Banner(title.clone())),
        ],
        Step::Note { text } => vec![Route::speaker(RenderMode::NoteText(text.clone()))],
        Step::Command { text } => vec![
            Route::speaker(RenderMode::Echo(format!("$ {}", text))),
            Route::audience(RenderMode::TypeAndExecute(text.clone())),
        ],
        Step::Display { content } => vec![
            Route::speaker(RenderMode::Echo(content.summary())),
            Route::audience(RenderMode::Render(content.clone())),
        ],
        Step::Pause { hint } => vec![Route::speaker(RenderMode::Waiting(hint.clone()))],
        Step::Keys { keys } => {
            let names: Vec<&str> = keys.iter().map(Key::tmux_name).collect();
            vec![
                Route::speaker(RenderMode::Echo(format!("keys: {}", names.join(" ")))),
                Route::audience(RenderMode::PressKeys(keys.clone())),
            ]
        }
        Step::Raw { text, paced } => vec![
            Route::speaker(RenderMode::Echo(step.to_string())),
            Route::audience(RenderMode::Input {
                text: text.clone(),
                paced: *paced,
            }),
        ],
        Step::Sleep { duration } => vec![Route::speaker(RenderMode::Hold(*duration))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn audience_routes(step: &Step) -> Vec<RenderMode> {
        route(step)
            .into_iter()
            .filter(|r| r.surface == Surface::Audience)
            .map(|r| r.mode)
            .collect()
    }

    #[test]
    fn note_never_routes_to_audience() {
        let step = Step::Note {
            text: "secret".to_string(),
        };
        assert!(audience_routes(&step).is_empty());
        assert_eq!(
            route(&step),
            vec![Route::speaker(RenderMode::NoteText("secret".to_string()))]
        );
    }

    #[test]
    fn pause_renders_only_a_speaker_indicator() {
        let step = Step::Pause {
            hint: Some("next".to_string()),
        };
        assert!(audience_routes(&step).is_empty());
        assert_eq!(
            route(&step),
            vec![Route::speaker(RenderMode::Waiting(Some("next".to_string())))]
        );
    }

    #[test]
    fn command_is_typed_for_audience_and_echoed_for_speaker() {
        let routes = route(&Step::Command {
            text: "ls -l".to_string(),
        });
        assert_eq!(
            routes,
            vec![
                Route::speaker(RenderMode::Echo("$ ls -l".to_string())),
                Route::audience(RenderMode::TypeAndExecute("ls -l".to_string())),
            ]
        );
    }

    #[test]
    fn chapter_reaches_both_surfaces() {
        let routes = route(&Step::Chapter {
            title: "Intro".to_string(),
        });
        assert_eq!(routes.len(), 2);
        assert!(routes
            .iter()
            .any(|r| r.mode == RenderMode::Banner("Intro".to_string())));
    }

    #[test]
    fn display_echoes_summary_not_content() {
        let step = Step::Display {
            content: DisplayContent::Image(PathBuf::from("tux.png")),
        };
        let routes = route(&step);
        assert_eq!(
            routes[0],
            Route::speaker(RenderMode::Echo("image: tux.png".to_string()))
        );
        assert_eq!(
            routes[1],
            Route::audience(RenderMode::Render(DisplayContent::Image(PathBuf::from(
                "tux.png"
            ))))
        );
    }

    #[test]
    fn raw_input_goes_to_audience_without_enter() {
        let routes = route(&Step::Raw {
            text: "(defun f ()\n  1)".to_string(),
            paced: true,
        });
        assert_eq!(
            routes,
            vec![
                Route::speaker(RenderMode::Echo("raw: (defun f () (+1 more lines)".to_string())),
                Route::audience(RenderMode::Input {
                    text: "(defun f ()\n  1)".to_string(),
                    paced: true
                }),
            ]
        );
    }

    #[test]
    fn sleep_touches_no_pane_output() {
        let routes = route(&Step::Sleep {
            duration: Duration::from_millis(10),
        });
        assert!(audience_routes(&Step::Sleep {
            duration: Duration::from_millis(10)
        })
        .is_empty());
        assert_eq!(routes.len(), 1);
    }
}
