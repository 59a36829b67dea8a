//! Playback sequencing
//!
//! The [`Sequencer`] owns the speech synthesizer and decides what to speak
//! next. It drives at most one utterance at a time, either a single phrase
//! or a "play all" run over a snapshot of the phrase list, and keeps the
//! progress telemetry for whatever is active.
//!
//! Modes: `Idle -> Speaking -> (Paused <-> Speaking) -> Idle`. Starting a
//! new utterance always cancels the previous one first.

pub mod telemetry;

use crate::speech::{SpeechEvent, Synth, Utterance, UtteranceId, Voice};
use crate::state::notice::{Notice, NoticeIcon, ViewEvent};
use crate::Result;
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use telemetry::{estimate_duration, ProgressTimer, Telemetry, TICK_INTERVAL, WORDS_PER_MINUTE};

/// What the sequencer is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Snapshot of the phrase list being played in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayQueue {
    items: Vec<String>,
    cursor: usize,
}

impl PlayQueue {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Position of the item being spoken
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Tuning for the sequencer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerSettings {
    pub words_per_minute: f32,
    pub tick_interval: Duration,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            words_per_minute: WORDS_PER_MINUTE,
            tick_interval: TICK_INTERVAL,
        }
    }
}

/// The utterance currently owned by the sequencer
#[derive(Debug)]
struct Active {
    id: UtteranceId,
    phrase_index: usize,
    timer: ProgressTimer,
}

/// Playback state machine
pub struct Sequencer {
    /// Speech engine, used by nothing else
    synth: Box<dyn Synth>,

    settings: SequencerSettings,

    mode: PlaybackMode,

    active: Option<Active>,

    /// Present only during a "play all" run
    queue: Option<PlayQueue>,

    telemetry: Telemetry,

    /// Last utterance id handed out
    generation: u64,

    voice: Option<String>,

    rate: f32,

    /// Events for the view layer, drained by the controller
    events: Vec<ViewEvent>,
}

impl Sequencer {
    pub fn new(synth: Box<dyn Synth>, settings: SequencerSettings) -> Self {
        Self {
            synth,
            settings,
            mode: PlaybackMode::Idle,
            active: None,
            queue: None,
            telemetry: Telemetry::default(),
            generation: 0,
            voice: None,
            rate: 1.0,
            events: Vec::new(),
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Index of the phrase being spoken or paused
    pub fn active_index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.phrase_index)
    }

    pub fn queue(&self) -> Option<&PlayQueue> {
        self.queue.as_ref()
    }

    pub fn is_playing_all(&self) -> bool {
        self.queue.is_some()
    }

    pub fn telemetry(&self) -> Telemetry {
        self.telemetry
    }

    /// Telemetry for `index` if it is the active phrase
    pub fn telemetry_for(&self, index: usize) -> Option<Telemetry> {
        (self.active_index() == Some(index)).then_some(self.telemetry)
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn set_voice(&mut self, voice: Option<String>) {
        debug!("Voice set to {:?}", voice);
        self.voice = voice;
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Applies from the next utterance on
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    /// Voices offered by the speech engine
    pub fn voices(&mut self) -> Result<Vec<Voice>> {
        self.synth.voices()
    }

    /// Take the view events produced since the last call
    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    fn notify(&mut self, icon: NoticeIcon, message: &str) {
        self.events
            .push(ViewEvent::Status(Notice::new(icon, message)));
    }

    /// Speak one phrase, abandoning any "play all" run
    ///
    /// Returns false when nothing was started.
    pub fn speak_one(&mut self, phrase_index: usize, text: &str, now: Instant) -> bool {
        if self.voice.is_none() {
            self.notify(NoticeIcon::Warning, "No voice available");
            return false;
        }
        self.queue = None;
        self.start(phrase_index, text, now)
    }

    /// Play a snapshot of `phrases` from the first to the last
    pub fn play_all(&mut self, phrases: &[String], now: Instant) -> bool {
        let Some(first) = phrases.first() else {
            self.notify(NoticeIcon::Empty, "No phrases to play");
            return false;
        };
        if self.voice.is_none() {
            self.notify(NoticeIcon::Warning, "No voice available");
            return false;
        }

        info!("Playing all {} phrases", phrases.len());
        let first = first.clone();
        self.queue = Some(PlayQueue {
            items: phrases.to_vec(),
            cursor: 0,
        });
        if !self.start(0, &first, now) {
            self.queue = None;
            return false;
        }
        true
    }

    /// Cancel whatever is playing and start a new utterance
    fn start(&mut self, phrase_index: usize, text: &str, now: Instant) -> bool {
        self.cancel_current();

        self.generation += 1;
        let id = UtteranceId(self.generation);
        let utterance = Utterance {
            id,
            text: text.to_string(),
            voice: self.voice.clone(),
            rate: self.rate,
        };

        if let Err(e) = self.synth.speak(&utterance) {
            warn!("Failed to start utterance {:?}: {}", id, e);
            self.mode = PlaybackMode::Idle;
            self.telemetry = Telemetry::default();
            return false;
        }

        let estimate = estimate_duration(text, self.rate, self.settings.words_per_minute);
        debug!(
            "Utterance {:?} for phrase {} estimated at {:.1}s",
            id, phrase_index, estimate
        );
        self.telemetry = Telemetry::starting(estimate);
        self.active = Some(Active {
            id,
            phrase_index,
            timer: ProgressTimer::start(id, self.settings.tick_interval, now),
        });
        self.mode = PlaybackMode::Speaking;
        self.notify(NoticeIcon::Speaking, "Speaking...");
        true
    }

    /// Silence the engine and forget the active utterance and its timer
    fn cancel_current(&mut self) {
        if let Err(e) = self.synth.cancel() {
            warn!("Failed to cancel speech: {}", e);
        }
        self.active = None;
    }

    /// Pause phrase `index` if it is the one speaking
    pub fn pause(&mut self, index: usize, now: Instant) -> bool {
        if self.active_index() != Some(index) {
            return false;
        }
        self.pause_active(now, "Paused")
    }

    /// Pause whatever is speaking
    pub fn pause_all(&mut self, now: Instant) -> bool {
        self.pause_active(now, "Paused all")
    }

    fn pause_active(&mut self, now: Instant, message: &str) -> bool {
        if self.mode != PlaybackMode::Speaking {
            return false;
        }
        if let Err(e) = self.synth.pause() {
            warn!("Pause failed: {}", e);
            return false;
        }
        if let Some(active) = self.active.as_mut() {
            active.timer.suspend(now);
            self.telemetry.advance_to(active.timer.elapsed().as_secs_f64());
        }
        self.mode = PlaybackMode::Paused;
        self.notify(NoticeIcon::Paused, message);
        true
    }

    /// Resume phrase `index` if it is the one paused
    pub fn resume(&mut self, index: usize, now: Instant) -> bool {
        if self.active_index() != Some(index) {
            return false;
        }
        self.resume_active(now, "Resumed")
    }

    /// Resume whatever is paused
    pub fn resume_all(&mut self, now: Instant) -> bool {
        self.resume_active(now, "Resumed all")
    }

    fn resume_active(&mut self, now: Instant, message: &str) -> bool {
        if self.mode != PlaybackMode::Paused {
            return false;
        }
        if let Err(e) = self.synth.resume() {
            warn!("Resume failed: {}", e);
            return false;
        }
        if let Some(active) = self.active.as_mut() {
            active.timer.unsuspend(now);
        }
        self.mode = PlaybackMode::Speaking;
        self.notify(NoticeIcon::Resumed, message);
        true
    }

    /// Stop everything and report it
    pub fn stop(&mut self) {
        self.halt();
        self.notify(NoticeIcon::Stopped, "Stopped");
    }

    /// Stop everything without a notice; safe to call repeatedly
    pub fn halt(&mut self) {
        self.cancel_current();
        self.queue = None;
        self.mode = PlaybackMode::Idle;
        self.telemetry = Telemetry::default();
    }

    /// Feed one engine event. Returns true when the voice list changed.
    pub fn handle_event(&mut self, event: SpeechEvent, now: Instant) -> bool {
        match event {
            SpeechEvent::VoicesChanged => return true,
            SpeechEvent::Started(id) => match self.active.as_mut() {
                Some(active) if active.id == id => {
                    debug!("Utterance {:?} started", id);
                    active.timer.restart(now);
                    self.telemetry = Telemetry::starting(self.telemetry.estimated_seconds);
                }
                _ => debug!("Ignoring start of superseded utterance {:?}", id),
            },
            SpeechEvent::Ended(id) => {
                if self.active.as_ref().map(|a| a.id) == Some(id) {
                    self.finish(now);
                } else {
                    debug!("Ignoring end of superseded utterance {:?}", id);
                }
            }
        }
        false
    }

    /// Natural completion of the active utterance
    fn finish(&mut self, now: Instant) {
        debug!("Utterance finished");
        self.telemetry.complete();
        self.active = None;
        self.mode = PlaybackMode::Idle;

        let Some(queue) = self.queue.as_mut() else {
            return;
        };
        queue.cursor += 1;
        let next = queue
            .items
            .get(queue.cursor)
            .cloned()
            .map(|text| (queue.cursor, text));

        match next {
            Some((index, text)) => {
                if !self.start(index, &text, now) {
                    warn!("Ending play-all run early at item {}", index);
                    self.queue = None;
                }
            }
            None => {
                info!("Finished playing all phrases");
                self.queue = None;
                self.notify(NoticeIcon::Finished, "Finished all phrases");
            }
        }
    }

    /// Advance progress telemetry if a tick is due
    pub fn tick(&mut self, now: Instant) {
        if self.mode != PlaybackMode::Speaking {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            if let Some(elapsed) = active.timer.tick(now) {
                self.telemetry.advance_to(elapsed.as_secs_f64());
            }
        }
    }

    /// Drain engine events and tick. Returns true when the voice list changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut voices_changed = false;
        for event in self.synth.poll_events() {
            voices_changed |= self.handle_event(event, now);
        }
        self.tick(now);
        voices_changed
    }

    /// When the next telemetry tick is due, if one is scheduled
    pub fn next_tick_due(&self) -> Option<Instant> {
        if self.mode != PlaybackMode::Speaking {
            return None;
        }
        self.active.as_ref().and_then(|a| a.timer.next_due())
    }
}
