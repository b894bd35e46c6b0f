//! Presenter signals.
//!
//! Signals arrive on a channel from whatever input source is in use
//! (keyboard thread, OS signal handler, a test). Skip and abort additionally
//! set atomic flags at send time, so a typing job in progress can notice
//! them between keystrokes without touching the channel. An advance that
//! arrives while a step is rendering is delivered as a skip, so an impatient
//! presenter flushes the typing job instead of queueing the next step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Presenter input understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Proceed to the next step
    Advance,
    /// Finish the typing job in progress instantly
    Skip,
    /// Stop the presentation
    Abort,
}

/// Flags polled between keystrokes while rendering.
#[derive(Debug, Default)]
pub struct SignalFlags {
    skip: AtomicBool,
    abort: Arc<AtomicBool>,
    rendering: AtomicBool,
}

impl SignalFlags {
    pub fn skip_requested(&self) -> bool {
        self.skip.load(Ordering::SeqCst)
    }

    /// Consume a pending skip request.
    pub fn take_skip(&self) -> bool {
        self.skip.swap(false, Ordering::SeqCst)
    }

    pub fn clear_skip(&self) {
        self.skip.store(false, Ordering::SeqCst);
    }

    pub fn abort_requested(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    /// Mark the start or end of a step render.
    pub fn set_rendering(&self, rendering: bool) {
        self.rendering.store(rendering, Ordering::SeqCst);
    }

    /// The raw abort flag, for registration with OS signal handlers.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }
}

/// Sending half; cheap to clone and move to input threads.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: Sender<Signal>,
    flags: Arc<SignalFlags>,
}

impl SignalSender {
    /// Deliver a signal.
    ///
    /// Returns false once the presentation has stopped listening.
    pub fn send(&self, signal: Signal) -> bool {
        let signal = match signal {
            Signal::Advance if self.flags.is_rendering() => Signal::Skip,
            other => other,
        };
        match signal {
            Signal::Skip => self.flags.skip.store(true, Ordering::SeqCst),
            Signal::Abort => self.flags.abort.store(true, Ordering::SeqCst),
            Signal::Advance => {}
        }
        self.tx.send(signal).is_ok()
    }
}

/// Receiving half, owned by the controller.
#[derive(Debug)]
pub struct Signals {
    rx: Receiver<Signal>,
    flags: Arc<SignalFlags>,
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (SignalSender, Signals) {
    let (tx, rx) = mpsc::channel();
    let flags = Arc::new(SignalFlags::default());
    (
        SignalSender {
            tx,
            flags: Arc::clone(&flags),
        },
        Signals { rx, flags },
    )
}

impl Signals {
    pub fn flags(&self) -> &SignalFlags {
        &self.flags
    }

    /// Block until the next signal.
    ///
    /// The abort flag is polled every `poll` so that flag-only sources (OS
    /// signal handlers) can interrupt the wait. A closed channel reads as
    /// abort.
    pub fn wait(&self, poll: Duration) -> Signal {
        loop {
            if self.flags.abort_requested() {
                return Signal::Abort;
            }
            match self.rx.recv_timeout(poll) {
                Ok(signal) => return signal,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Signal::Abort,
            }
        }
    }
}
