//! Phrase list with write-through persistence
//!
//! Every mutation rewrites the whole `{phrases, rate, timestamp}` record.
//! Writes are fire-and-forget: a failed write is logged and the in-memory
//! list stays authoritative for the session.

use super::KeyValueStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Key of the JSON phrase record
pub const DATA_KEY: &str = "trainer_data";

/// Key of the preferred voice id
pub const VOICE_KEY: &str = "preferred_voice";

pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 2.0;
pub const DEFAULT_RATE: f32 = 1.0;

/// List shown on first launch
const DEFAULT_PHRASES: &[&str] = &["Welcome!"];

/// Clamp to [0.1, 2.0] and round to the 0.1 step of the rate control
pub fn normalize_rate(rate: f32) -> f32 {
    if !rate.is_finite() {
        return DEFAULT_RATE;
    }
    (rate.clamp(MIN_RATE, MAX_RATE) * 10.0).round() / 10.0
}

fn default_rate() -> f32 {
    DEFAULT_RATE
}

/// Persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default = "default_rate")]
    pub rate: f32,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl SavedState {
    fn defaults() -> Self {
        Self {
            phrases: DEFAULT_PHRASES.iter().map(|s| s.to_string()).collect(),
            rate: DEFAULT_RATE,
            timestamp: 0,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Ordered phrase list plus the persisted speech preferences
pub struct PhraseStore {
    phrases: Vec<String>,
    rate: f32,
    voice: Option<String>,
    storage: Box<dyn KeyValueStore>,
}

impl PhraseStore {
    /// Load saved state, falling back to the defaults when there is none
    pub fn load(storage: Box<dyn KeyValueStore>) -> Self {
        let saved = match storage.get(DATA_KEY) {
            None => {
                info!("No saved phrases, starting with defaults");
                SavedState::defaults()
            }
            Some(raw) => match serde_json::from_str::<SavedState>(&raw) {
                Ok(saved) => saved,
                Err(e) => {
                    warn!("Ignoring malformed saved data: {}", e);
                    SavedState::defaults()
                }
            },
        };

        let phrases: Vec<String> = saved
            .phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        let voice = storage
            .get(VOICE_KEY)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        debug!("Loaded {} phrases, rate {}", phrases.len(), saved.rate);
        Self {
            phrases,
            rate: normalize_rate(saved.rate),
            voice,
            storage,
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.phrases.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Preferred voice id
    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    /// Append a phrase. Blank input is rejected and nothing changes.
    pub fn add(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank phrase");
            return false;
        }
        self.phrases.push(text.to_string());
        self.save();
        true
    }

    /// Remove the phrase at `index` if it still reads `expected`
    ///
    /// A mismatch means the list changed under the caller; nothing is removed.
    pub fn delete(&mut self, index: usize, expected: &str) -> bool {
        if self.get(index) != Some(expected) {
            debug!("Stale delete of {:?} at {} ignored", expected, index);
            return false;
        }
        self.phrases.remove(index);
        self.save();
        true
    }

    /// Empty the list
    pub fn clear(&mut self) {
        self.phrases.clear();
        self.save();
    }

    /// Set the speech rate; returns the value actually stored
    pub fn set_rate(&mut self, rate: f32) -> f32 {
        self.rate = normalize_rate(rate);
        self.save();
        self.rate
    }

    pub fn set_voice(&mut self, voice_id: &str) {
        self.voice = Some(voice_id.to_string());
        if let Err(e) = self.storage.set(VOICE_KEY, voice_id) {
            warn!("Failed to save preferred voice: {}", e);
        }
    }

    /// Snapshot of what gets persisted
    pub fn saved_state(&self) -> SavedState {
        SavedState {
            phrases: self.phrases.clone(),
            rate: self.rate,
            timestamp: now_millis(),
        }
    }

    fn save(&mut self) {
        let record = match serde_json::to_string(&self.saved_state()) {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to serialize phrases: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(DATA_KEY, &record) {
            warn!("Failed to save phrases: {}", e);
        }
    }
}
