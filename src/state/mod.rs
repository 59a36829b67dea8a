//! Application state management
//!
//! The State struct is the top-level controller. It owns the phrase store,
//! the playback sequencer and the notice board, and every user action
//! goes through one of its methods.

pub mod config;
pub mod notice;

use crate::playback::telemetry::Telemetry;
use crate::playback::{PlaybackMode, Sequencer, SequencerSettings};
use crate::speech::{Synth, Voice};
use crate::store::{FileStore, KeyValueStore, PhraseStore};
use crate::Result;
use config::Config;
use log::{debug, info, warn};
use notice::{Notice, NoticeBoard, NoticeIcon, ViewEvent};
use std::time::{Duration, Instant};

/// Main application state for the trainer
pub struct State {
    /// Phrase list and saved preferences; changed only through the operations below
    phrases: PhraseStore,

    /// Single playback track, sole owner of the speech engine
    sequencer: Sequencer,

    /// Voices offered by the engine, refreshed on every voices-changed event
    voices: Vec<Voice>,

    /// Latest transient notice
    notices: NoticeBoard,

    /// Set when the list was emptied; cleared when the user dismisses it
    empty_prompt: bool,

    /// Lines for the front-end to print above the status line
    output: Vec<String>,

    /// Set by the quit command
    pub quit: bool,
}

impl State {
    /// Create the state from configuration, building the speech engine and store it names
    pub fn new(config: &Config) -> Result<Self> {
        let synth = crate::speech::create_synth(config.backend(), config.words_per_minute())?;
        info!("Speech synthesizer created");

        let dir = config.data_dir().unwrap_or_else(FileStore::default_dir);
        let storage = FileStore::open(dir)?;
        info!("Phrases stored in {:?}", storage.dir());

        let settings = SequencerSettings {
            words_per_minute: config.words_per_minute(),
            tick_interval: config.tick_interval(),
        };
        Ok(Self::with_parts(
            synth,
            Box::new(storage),
            settings,
            config.notice_duration(),
        ))
    }

    /// Assemble the state from explicit collaborators
    pub fn with_parts(
        synth: Box<dyn Synth>,
        storage: Box<dyn KeyValueStore>,
        settings: SequencerSettings,
        notice_duration: Duration,
    ) -> Self {
        let phrases = PhraseStore::load(storage);
        let mut sequencer = Sequencer::new(synth, settings);
        sequencer.set_rate(phrases.rate());

        info!("Loaded {} phrases", phrases.len());
        Self {
            phrases,
            sequencer,
            voices: Vec::new(),
            notices: NoticeBoard::new(notice_duration),
            empty_prompt: false,
            output: Vec::new(),
            quit: false,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.sequencer.mode()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.sequencer.active_index()
    }

    pub fn is_playing_all(&self) -> bool {
        self.sequencer.is_playing_all()
    }

    pub fn telemetry(&self) -> Telemetry {
        self.sequencer.telemetry()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Read-only view of the phrase list; use `add_phrase`, `delete_phrase`
    /// and `clear_phrases` to change it so playback stays consistent
    pub fn phrases(&self) -> &PhraseStore {
        &self.phrases
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Voice currently used for speaking
    pub fn current_voice(&self) -> Option<&Voice> {
        let id = self.sequencer.voice()?;
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn rate(&self) -> f32 {
        self.phrases.rate()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    pub fn empty_prompt(&self) -> bool {
        self.empty_prompt
    }

    pub fn dismiss_empty_prompt(&mut self) {
        self.empty_prompt = false;
    }

    /// Queue a line for the front-end to print
    pub fn print(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    fn dispatch(&mut self, event: ViewEvent, now: Instant) {
        match event {
            ViewEvent::Status(notice) => self.notices.post(notice, now),
            ViewEvent::EmptyList => self.empty_prompt = true,
        }
    }

    fn post(&mut self, icon: NoticeIcon, message: &str, now: Instant) {
        self.dispatch(ViewEvent::Status(Notice::new(icon, message)), now);
    }

    /// Show a warning notice, e.g. for a mistyped command
    pub fn warn(&mut self, message: &str, now: Instant) {
        self.post(NoticeIcon::Warning, message, now);
    }

    /// Move sequencer events onto the notice board
    fn route_events(&mut self, now: Instant) {
        for event in self.sequencer.drain_events() {
            self.dispatch(event, now);
        }
    }

    /// Append a phrase
    pub fn add_phrase(&mut self, text: &str, now: Instant) -> bool {
        if !self.phrases.add(text) {
            self.post(NoticeIcon::Warning, "Type a phrase first", now);
            return false;
        }
        debug!("Added phrase {}", self.phrases.len());
        self.post(NoticeIcon::Added, "Phrase added", now);
        true
    }

    /// Delete phrase `index` if it still reads `expected`
    ///
    /// Deleting the active phrase stops playback before the list changes.
    pub fn delete_phrase(&mut self, index: usize, expected: &str, now: Instant) -> bool {
        if self.phrases.get(index) != Some(expected) {
            debug!("Stale delete ignored");
            return false;
        }
        if self.sequencer.active_index() == Some(index) {
            self.sequencer.stop();
            self.route_events(now);
        }
        self.phrases.delete(index, expected);
        self.post(NoticeIcon::Deleted, "Phrase deleted", now);
        true
    }

    /// Whether clearing needs confirmation; posts a notice when there is nothing to clear
    pub fn request_clear(&mut self, now: Instant) -> bool {
        if self.phrases.is_empty() {
            self.post(NoticeIcon::Warning, "No phrases to clear", now);
            return false;
        }
        true
    }

    /// Empty the list and stop playback
    pub fn clear_phrases(&mut self, now: Instant) {
        self.sequencer.halt();
        self.route_events(now);
        self.phrases.clear();
        info!("All phrases cleared");
        self.post(NoticeIcon::Cleared, "All phrases cleared", now);
        self.dispatch(ViewEvent::EmptyList, now);
    }

    /// Speak a single phrase
    pub fn speak_phrase(&mut self, index: usize, now: Instant) -> bool {
        let Some(text) = self.phrases.get(index).map(str::to_string) else {
            self.post(NoticeIcon::Warning, "No such phrase", now);
            return false;
        };
        let started = self.sequencer.speak_one(index, &text, now);
        self.route_events(now);
        started
    }

    /// Speak every phrase in order
    pub fn play_all(&mut self, now: Instant) -> bool {
        let snapshot = self.phrases.phrases().to_vec();
        let started = self.sequencer.play_all(&snapshot, now);
        self.route_events(now);
        started
    }

    pub fn pause_phrase(&mut self, index: usize, now: Instant) -> bool {
        let paused = self.sequencer.pause(index, now);
        self.route_events(now);
        paused
    }

    pub fn resume_phrase(&mut self, index: usize, now: Instant) -> bool {
        let resumed = self.sequencer.resume(index, now);
        self.route_events(now);
        resumed
    }

    pub fn pause_all(&mut self, now: Instant) -> bool {
        let paused = self.sequencer.pause_all(now);
        self.route_events(now);
        paused
    }

    pub fn resume_all(&mut self, now: Instant) -> bool {
        let resumed = self.sequencer.resume_all(now);
        self.route_events(now);
        resumed
    }

    pub fn stop_all(&mut self, now: Instant) {
        self.sequencer.stop();
        self.route_events(now);
    }

    /// Change the speech rate; returns the stored value
    pub fn set_rate(&mut self, rate: f32) -> f32 {
        let rate = self.phrases.set_rate(rate);
        self.sequencer.set_rate(rate);
        info!("Speech rate set to {:.1}", rate);
        rate
    }

    /// Select voice by its position in [`State::voices`] and remember it
    pub fn select_voice(&mut self, index: usize, now: Instant) -> bool {
        let Some(voice) = self.voices.get(index).cloned() else {
            self.post(NoticeIcon::Warning, "No such voice", now);
            return false;
        };
        info!("Selected voice {}", voice.label());
        self.sequencer.set_voice(Some(voice.id.clone()));
        self.phrases.set_voice(&voice.id);
        true
    }

    /// Re-read the voice list and pick the saved voice, else the first one
    pub fn refresh_voices(&mut self) {
        self.voices = match self.sequencer.voices() {
            Ok(voices) => voices,
            Err(e) => {
                warn!("Failed to list voices: {}", e);
                Vec::new()
            }
        };

        let preferred = self
            .phrases
            .voice()
            .and_then(|id| self.voices.iter().find(|v| v.id == id))
            .or_else(|| self.voices.first())
            .map(|v| v.id.clone());
        info!("{} voices, using {:?}", self.voices.len(), preferred);
        self.sequencer.set_voice(preferred);
    }

    /// Drain engine events, tick telemetry and expire notices
    pub fn update(&mut self, now: Instant) {
        if self.sequencer.poll(now) {
            self.refresh_voices();
        }
        self.route_events(now);
        self.notices.expire(now);
    }

    /// How long the event loop may sleep before the next update is needed
    pub fn time_until_next_update(&self, now: Instant) -> Option<Duration> {
        [self.sequencer.next_tick_due(), self.notices.deadline()]
            .into_iter()
            .flatten()
            .min()
            .map(|due| due.saturating_duration_since(now))
    }
}
