//! Human-like typing simulation.
//!
//! Text is written one unit (character or word) per keystroke write, with a
//! randomized pause before each write so the audience sees a person typing
//! rather than a pasted block. Pending skip requests flush the rest of the
//! text in one write; abort requests stop before the terminator, so a
//! partially typed command is never executed.

use crate::backend::{Key, PaneHandle, SessionBackend};
use crate::config::{Granularity, TypingConfig};
use crate::error::Result;
use crate::signals::{Signal, SignalFlags, SignalSender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of delays. Swapped out in tests so typing runs instantly.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that records requested delays instead of sleeping.
///
/// Can deliver a signal on the n-th sleep, which is how tests simulate a
/// presenter pressing skip or abort while a command is being typed.
#[derive(Debug, Default)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
    trigger: Mutex<Option<(usize, SignalSender, Signal)>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `signal` through `sender` during the `nth` sleep (1-based).
    pub fn signal_on_sleep(&self, nth: usize, sender: SignalSender, signal: Signal) {
        if let Ok(mut trigger) = self.trigger.lock() {
            *trigger = Some((nth, sender, signal));
        }
    }

    /// Every delay requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Clock for RecordingClock {
    fn sleep(&self, duration: Duration) {
        let count = match self.sleeps.lock() {
            Ok(mut sleeps) => {
                sleeps.push(duration);
                sleeps.len()
            }
            Err(_) => return,
        };
        if let Ok(mut trigger) = self.trigger.lock() {
            if matches!(*trigger, Some((nth, _, _)) if nth == count) {
                if let Some((_, sender, signal)) = trigger.take() {
                    sender.send(signal);
                }
            }
        }
    }
}

/// What follows the typed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    None,
    /// Press Enter once the whole text is in the pane
    Enter,
}

/// How a typing job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingOutcome {
    /// Every unit typed with pacing
    Completed,
    /// A skip request flushed the remaining text in one write
    Flushed,
    /// An abort request stopped the job; the terminator was not sent
    Aborted,
}

/// Remaining units of one typing request.
#[derive(Debug)]
struct TypingJob {
    units: VecDeque<String>,
}

impl TypingJob {
    fn new(text: &str, granularity: Granularity) -> Self {
        let units = match granularity {
            Granularity::Char => text.chars().map(String::from).collect(),
            Granularity::Word => split_words(text).into_iter().collect(),
        };
        Self { units }
    }

    fn next_unit(&mut self) -> Option<String> {
        self.units.pop_front()
    }

    fn drain_rest(&mut self) -> String {
        self.units.drain(..).collect()
    }
}

/// Split text into words, each keeping its trailing whitespace.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_space = false;

    for c in text.chars() {
        if in_space && !c.is_whitespace() {
            words.push(std::mem::take(&mut current));
        }
        in_space = c.is_whitespace();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Pacing parameters in a form ready for sampling.
#[derive(Debug, Clone)]
pub struct TypingOptions {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the extra pause after a word boundary
    pub word_delay: Duration,
    pub granularity: Granularity,
    /// Probability of a visible typo that is immediately backspaced
    pub typo_rate: f64,
    /// Skip every delay
    pub speedy: bool,
}

impl From<&TypingConfig> for TypingOptions {
    fn from(config: &TypingConfig) -> Self {
        let (min, max) = if config.min_delay_ms <= config.max_delay_ms {
            (config.min_delay_ms, config.max_delay_ms)
        } else {
            (config.max_delay_ms, config.min_delay_ms)
        };
        Self {
            min_delay: Duration::from_millis(min),
            max_delay: Duration::from_millis(max),
            word_delay: Duration::from_millis(config.word_delay_ms),
            granularity: config.granularity,
            typo_rate: config.typo_rate.clamp(0.0, 1.0),
            speedy: config.speedy,
        }
    }
}

impl Default for TypingOptions {
    fn default() -> Self {
        Self::from(&TypingConfig::default())
    }
}

/// Types text into panes with human cadence.
pub struct Typist {
    options: TypingOptions,
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl Typist {
    pub fn new(options: TypingOptions) -> Self {
        Self {
            options,
            rng: StdRng::from_entropy(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a fixed seed so delays and typos are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sample the pause before the next keystroke.
    pub fn keystroke_delay(&mut self, after_word: bool) -> Duration {
        let min = self.options.min_delay.as_millis() as u64;
        let max = self.options.max_delay.as_millis() as u64;
        let mut millis = self.rng.gen_range(min..=max);
        if after_word {
            millis += self
                .rng
                .gen_range(0..=self.options.word_delay.as_millis() as u64);
        }
        Duration::from_millis(millis)
    }

    fn pause(&mut self, after_word: bool) {
        if !self.options.speedy {
            let delay = self.keystroke_delay(after_word);
            self.clock.sleep(delay);
        }
    }

    /// Wait out a fixed delay on this typist's clock.
    ///
    /// Sleeps in short slices so an abort can cut it short; returns false if
    /// it did. Speedy mode skips the wait.
    pub fn hold(&self, duration: Duration, flags: &SignalFlags) -> bool {
        const SLICE: Duration = Duration::from_millis(50);
        if self.options.speedy {
            return !flags.abort_requested();
        }
        let mut remaining = duration;
        while !remaining.is_zero() {
            if flags.abort_requested() {
                return false;
            }
            let slice = remaining.min(SLICE);
            self.clock.sleep(slice);
            remaining -= slice;
        }
        !flags.abort_requested()
    }

    /// Type `text` into `pane`, then send the terminator.
    ///
    /// Flags are polled between writes. A skip flushes the remaining text as
    /// one write and still sends the terminator; an abort returns before the
    /// terminator so the pane never executes a partial line.
    pub fn type_text(
        &mut self,
        backend: &dyn SessionBackend,
        pane: &PaneHandle,
        text: &str,
        terminator: Terminator,
        flags: &SignalFlags,
    ) -> Result<TypingOutcome> {
        // A skip only applies to the job it interrupts
        flags.clear_skip();

        let mut job = TypingJob::new(text, self.options.granularity);
        let mut outcome = TypingOutcome::Completed;
        let mut after_word = false;

        while let Some(unit) = job.next_unit() {
            self.pause(after_word);

            if flags.abort_requested() {
                return Ok(TypingOutcome::Aborted);
            }
            if flags.take_skip() {
                let rest = format!("{}{}", unit, job.drain_rest());
                backend.send_keys(pane, &rest)?;
                outcome = TypingOutcome::Flushed;
                break;
            }

            self.maybe_typo(backend, pane, &unit)?;
            backend.send_keys(pane, &unit)?;
            after_word = unit.ends_with(char::is_whitespace);
        }

        if terminator == Terminator::Enter {
            if outcome == TypingOutcome::Completed {
                self.pause(false);
            }
            if flags.abort_requested() {
                return Ok(TypingOutcome::Aborted);
            }
            backend.send_key(pane, &Key::Enter)?;
        }
        Ok(outcome)
    }

    /// Occasionally type a wrong letter and backspace over it.
    fn maybe_typo(
        &mut self,
        backend: &dyn SessionBackend,
        pane: &PaneHandle,
        unit: &str,
    ) -> Result<()> {
        let mut chars = unit.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Ok(());
        };
        if !c.is_ascii_alphabetic() || !self.rng.gen_bool(self.options.typo_rate) {
            return Ok(());
        }

        let wrong = loop {
            let candidate = self.rng.gen_range(b'a'..=b'z') as char;
            if candidate != c.to_ascii_lowercase() {
                break candidate;
            }
        };
        backend.send_keys(pane, &wrong.to_string())?;
        self.pause(false);
        backend.send_key(pane, &Key::Backspace)?;
        self.pause(false);
        Ok(())
    }
}
