//! Resumable timed sequences.
//!
//! A [`Countdown`] is advanced by `dt` once per tick. A [`SequenceSlot`]
//! holds at most one running countdown tagged with a phase, so an actor can
//! never have two fades (or two catch effects) fighting over the same value.

use tracing::trace;

/// A timer counting down from a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    duration: f32,
    remaining: f32,
}

impl Countdown {
    /// Start a countdown. Negative durations are treated as zero.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        let duration = duration.max(0.0);
        Self {
            duration,
            remaining: duration,
        }
    }

    /// Advance by `dt`; returns `true` once the countdown has expired.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.is_done()
    }

    /// Whether nothing remains.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Seconds left.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Total length.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Elapsed fraction, 0 at start and 1 when done.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            1.0 - self.remaining / self.duration
        }
    }
}

/// Holds at most one running sequence, tagged with a phase `P`.
#[derive(Debug, Clone)]
pub struct SequenceSlot<P> {
    running: Option<(P, Countdown)>,
}

impl<P> Default for SequenceSlot<P> {
    fn default() -> Self {
        Self { running: None }
    }
}

impl<P: Copy + std::fmt::Debug> SequenceSlot<P> {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `phase` for `duration` seconds, discarding anything in flight.
    pub fn start(&mut self, phase: P, duration: f32) {
        if let Some((old, _)) = self.running.take() {
            trace!(cancelled = ?old, started = ?phase, "Sequence restarted");
        }
        self.running = Some((phase, Countdown::new(duration)));
    }

    /// Drop the running sequence, if any.
    pub fn cancel(&mut self) {
        self.running = None;
    }

    /// Advance the running sequence; returns its phase when it finishes this
    /// tick. The slot is empty afterwards.
    pub fn advance(&mut self, dt: f32) -> Option<P> {
        let (phase, countdown) = self.running.as_mut()?;
        if countdown.advance(dt) {
            let phase = *phase;
            self.running = None;
            Some(phase)
        } else {
            None
        }
    }

    /// Phase of the running sequence.
    #[must_use]
    pub fn phase(&self) -> Option<P> {
        self.running.as_ref().map(|(p, _)| *p)
    }

    /// The running countdown.
    #[must_use]
    pub fn countdown(&self) -> Option<&Countdown> {
        self.running.as_ref().map(|(_, c)| c)
    }

    /// Whether anything is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}
