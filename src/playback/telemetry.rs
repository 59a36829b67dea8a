//! Estimated progress for the active utterance
//!
//! Speech engines do not report how far into an utterance they are, so
//! progress is estimated from the word count and the speaking rate. The
//! estimate is never corrected mid-utterance; only natural completion
//! snaps it to 100%.

use crate::speech::UtteranceId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::{Duration, Instant};

/// Assumed speaking speed at rate 1.0
pub const WORDS_PER_MINUTE: f32 = 150.0;

/// Default telemetry cadence
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Number of whitespace-separated words in `text`
pub fn word_count(text: &str) -> usize {
    WHITESPACE
        .split(text.trim())
        .filter(|word| !word.is_empty())
        .count()
}

/// Estimated speaking time in seconds: words / (wpm * rate) * 60
pub fn estimate_duration(text: &str, rate: f32, words_per_minute: f32) -> f64 {
    let speed = f64::from(words_per_minute) * f64::from(rate);
    if speed <= 0.0 {
        return 0.0;
    }
    word_count(text) as f64 * 60.0 / speed
}

/// Progress figures shown for the active phrase
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    pub estimated_seconds: f64,
    pub elapsed_seconds: f64,
    pub remaining_seconds: f64,
    pub progress_percent: f64,
}

impl Telemetry {
    /// Fresh telemetry for an utterance of the given estimated length
    pub fn starting(estimated_seconds: f64) -> Self {
        Self {
            estimated_seconds,
            elapsed_seconds: 0.0,
            remaining_seconds: estimated_seconds,
            progress_percent: 0.0,
        }
    }

    /// Recompute remaining time and percentage for a new elapsed time
    pub fn advance_to(&mut self, elapsed_seconds: f64) {
        self.elapsed_seconds = elapsed_seconds;
        self.remaining_seconds = (self.estimated_seconds - elapsed_seconds).max(0.0);
        self.progress_percent = if self.estimated_seconds > 0.0 {
            (elapsed_seconds / self.estimated_seconds * 100.0).min(100.0)
        } else {
            100.0
        };
    }

    /// Natural completion always reads as done
    pub fn complete(&mut self) {
        self.remaining_seconds = 0.0;
        self.progress_percent = 100.0;
    }
}

/// Periodic timer driving [`Telemetry`] for one utterance
///
/// Owned by the active utterance, so it disappears with it.
#[derive(Debug, Clone)]
pub struct ProgressTimer {
    utterance: UtteranceId,
    interval: Duration,
    next_due: Instant,
    last_tick: Instant,
    elapsed: Duration,
    paused: bool,
}

impl ProgressTimer {
    pub fn start(utterance: UtteranceId, interval: Duration, now: Instant) -> Self {
        Self {
            utterance,
            interval,
            next_due: now + interval,
            last_tick: now,
            elapsed: Duration::ZERO,
            paused: false,
        }
    }

    pub fn utterance(&self) -> UtteranceId {
        self.utterance
    }

    /// When the next tick should run, or `None` while paused
    pub fn next_due(&self) -> Option<Instant> {
        (!self.paused).then_some(self.next_due)
    }

    /// Run a tick if one is due. Returns the new elapsed time when it ran.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        if self.paused || now < self.next_due {
            return None;
        }
        self.elapsed += now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.next_due = now + self.interval;
        Some(self.elapsed)
    }

    /// Time counted so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Stop counting; time spent paused never reaches `elapsed`
    pub fn suspend(&mut self, now: Instant) {
        if !self.paused {
            self.elapsed += now.saturating_duration_since(self.last_tick);
            self.last_tick = now;
            self.paused = true;
        }
    }

    pub fn unsuspend(&mut self, now: Instant) {
        if self.paused {
            self.paused = false;
            self.last_tick = now;
            self.next_due = now + self.interval;
        }
    }

    /// Restart the clock at the engine's actual start
    pub fn restart(&mut self, now: Instant) {
        self.elapsed = Duration::ZERO;
        self.last_tick = now;
        self.next_due = now + self.interval;
    }
}
