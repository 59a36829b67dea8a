//! Audio-free backend
//!
//! Produces no sound. Each utterance "finishes" once its estimated
//! speaking time has passed, which keeps the trainer usable on machines
//! without a speech engine.

use crate::playback::telemetry::{estimate_duration, WORDS_PER_MINUTE};
use crate::speech::{SpeechEvent, Synth, Utterance, UtteranceId, Voice};
use crate::Result;
use log::debug;
use std::time::{Duration, Instant};

struct Timed {
    id: UtteranceId,
    /// Speaking time still owed when the clock was last stopped
    remaining: Duration,
    /// Set while playing, cleared while paused
    resumed_at: Option<Instant>,
}

/// Silent timing-only backend
pub struct SilentSynth {
    /// Speaking speed at rate 1.0, the same figure the progress estimate uses
    words_per_minute: f32,
    current: Option<Timed>,
    pending: Vec<SpeechEvent>,
}

impl SilentSynth {
    pub fn new(words_per_minute: f32) -> Self {
        Self {
            words_per_minute,
            current: None,
            pending: vec![SpeechEvent::VoicesChanged],
        }
    }
}

impl Default for SilentSynth {
    fn default() -> Self {
        Self::new(WORDS_PER_MINUTE)
    }
}

impl Synth for SilentSynth {
    fn voices(&mut self) -> Result<Vec<Voice>> {
        Ok(vec![Voice {
            id: "silent".to_string(),
            display_name: "Silent".to_string(),
            language: "und".to_string(),
        }])
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let seconds = estimate_duration(&utterance.text, utterance.rate, self.words_per_minute);
        debug!("Silently speaking for {:.1}s: {}", seconds, utterance.text);
        self.current = Some(Timed {
            id: utterance.id,
            remaining: Duration::from_secs_f64(seconds),
            resumed_at: Some(Instant::now()),
        });
        self.pending.push(SpeechEvent::Started(utterance.id));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(timed) = self.current.as_mut() {
            if let Some(resumed_at) = timed.resumed_at.take() {
                timed.remaining = timed.remaining.saturating_sub(resumed_at.elapsed());
            }
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(timed) = self.current.as_mut() {
            timed.resumed_at.get_or_insert_with(Instant::now);
        }
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SpeechEvent> {
        let finished = self.current.as_ref().and_then(|timed| {
            let resumed_at = timed.resumed_at?;
            (resumed_at.elapsed() >= timed.remaining).then_some(timed.id)
        });
        if let Some(id) = finished {
            self.pending.push(SpeechEvent::Ended(id));
            self.current = None;
        }
        std::mem::take(&mut self.pending)
    }
}
