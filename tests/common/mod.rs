//! Shared test fixtures: a scripted speech engine and a shareable store

#![allow(dead_code)]

use ptrain::playback::SequencerSettings;
use ptrain::speech::{SpeechEvent, Synth, Utterance, UtteranceId, Voice};
use ptrain::state::State;
use ptrain::store::{KeyValueStore, MemoryStore};
use ptrain::{Result, TrainerError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// What the fake engine was asked to do, and what it will report next
#[derive(Default)]
pub struct Script {
    pub spoken: Vec<Utterance>,
    pub cancels: usize,
    pub pauses: usize,
    pub resumes: usize,
    pub pending: Vec<SpeechEvent>,
    pub voices: Vec<Voice>,
    pub fail_pause: bool,
}

impl Script {
    /// Report the natural end of the most recent utterance
    pub fn finish_last(&mut self) {
        if let Some(id) = self.spoken.last().map(|u| u.id) {
            self.pending.push(SpeechEvent::Ended(id));
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken.iter().map(|u| u.text.clone()).collect()
    }
}

/// Engine that records calls and replays scripted events
pub struct FakeSynth(Arc<Mutex<Script>>);

impl Synth for FakeSynth {
    fn voices(&mut self) -> Result<Vec<Voice>> {
        Ok(self.0.lock().unwrap().voices.clone())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let mut script = self.0.lock().unwrap();
        script.spoken.push(utterance.clone());
        script.pending.push(SpeechEvent::Started(utterance.id));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut script = self.0.lock().unwrap();
        if script.fail_pause {
            return Err(TrainerError::Unsupported("pause"));
        }
        script.pauses += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.0.lock().unwrap().resumes += 1;
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.0.lock().unwrap().cancels += 1;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SpeechEvent> {
        std::mem::take(&mut self.0.lock().unwrap().pending)
    }
}

/// Store that outlives the state using it, for reload tests
#[derive(Clone, Default)]
pub struct SharedStore(pub Arc<Mutex<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.0.lock().unwrap().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.0.lock().unwrap().remove(key)
    }
}

pub fn voice(id: &str) -> Voice {
    Voice {
        id: id.to_string(),
        display_name: id.to_uppercase(),
        language: "en-US".to_string(),
    }
}

pub struct Harness {
    pub state: State,
    pub script: Arc<Mutex<Script>>,
    pub store: SharedStore,
    pub t0: Instant,
}

impl Harness {
    /// State over `phrases` with one voice, voices already loaded
    pub fn with_phrases(phrases: &[&str]) -> Self {
        let store = SharedStore::default();
        let record = serde_json::json!({ "phrases": phrases, "rate": 1.0, "timestamp": 1 });
        store
            .clone()
            .set("trainer_data", &record.to_string())
            .unwrap();
        Self::with_store(store, vec![voice("en")])
    }

    pub fn with_store(store: SharedStore, voices: Vec<Voice>) -> Self {
        let script = Arc::new(Mutex::new(Script {
            voices,
            pending: vec![SpeechEvent::VoicesChanged],
            ..Script::default()
        }));
        let mut state = State::with_parts(
            Box::new(FakeSynth(script.clone())),
            Box::new(store.clone()),
            SequencerSettings::default(),
            Duration::from_millis(1800),
        );
        let t0 = Instant::now();
        state.update(t0);
        Self {
            state,
            script,
            store,
            t0,
        }
    }

    pub fn at(&self, millis: u64) -> Instant {
        self.t0 + Duration::from_millis(millis)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.script.lock().unwrap().texts()
    }

    pub fn last_id(&self) -> Option<UtteranceId> {
        self.script.lock().unwrap().spoken.last().map(|u| u.id)
    }

    /// End the current utterance and let the state react
    pub fn finish(&mut self, now: Instant) {
        self.script.lock().unwrap().finish_last();
        self.state.update(now);
    }

    pub fn notice(&self) -> Option<String> {
        self.state.notice().map(|n| n.message.clone())
    }
}
