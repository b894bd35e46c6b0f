//! Shared helpers for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use termstage::backend::{MemoryBackend, SessionBackend, SessionOptions};
use termstage::config::{Granularity, SessionConfig};
use termstage::typing::{Clock, RecordingClock, TypingOptions, Typist};
use termstage::{Presentation, Script, Surfaces};

/// Directory holding the test fixtures.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Copy a fixture into a fresh temp dir and return both.
pub fn temp_fixture(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join(name);
    std::fs::copy(fixtures_dir().join(name), &path).expect("copy fixture");
    (dir, path)
}

/// Typing with real cadence parameters but a clock that never sleeps.
pub fn typist(clock: Arc<RecordingClock>) -> Typist {
    let options = TypingOptions {
        min_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(90),
        word_delay: Duration::from_millis(100),
        granularity: Granularity::Char,
        typo_rate: 0.0,
        speedy: false,
    };
    let clock: Arc<dyn Clock> = clock;
    Typist::new(options).with_seed(7).with_clock(clock)
}

/// A presentation on a fresh in-memory backend.
pub struct Stage {
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<RecordingClock>,
    pub surfaces: Surfaces,
}

impl Stage {
    pub fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let surfaces = Surfaces::open(
            backend.as_ref(),
            "demo",
            &SessionConfig::default(),
            &SessionOptions::default(),
        )
        .expect("open surfaces");
        Self {
            backend,
            clock: Arc::new(RecordingClock::new()),
            surfaces,
        }
    }

    pub fn present(&self, script: Script) -> Presentation {
        let backend: Arc<dyn SessionBackend> = self.backend.clone();
        Presentation::new(script, backend, self.surfaces.clone())
            .with_typist(typist(self.clock.clone()))
            .with_fresh_prompt(false)
    }

    pub fn audience(&self) -> String {
        self.backend.transcript(&self.surfaces.audience)
    }

    pub fn speaker(&self) -> String {
        self.backend.transcript(&self.surfaces.speaker)
    }

    pub fn executed(&self) -> Vec<String> {
        self.backend.executed(&self.surfaces.audience)
    }
}
