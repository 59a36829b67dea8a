//! Speech synthesizer abstraction
//!
//! Provides a unified interface for text-to-speech across platforms.
//! The playback sequencer is the only caller; it owns the synthesizer
//! exclusively and reacts to the events it reports.

use crate::{Result, TrainerError};
use log::info;

/// Identifier of one utterance
///
/// Allocated by the caller from an increasing counter and echoed back in
/// [`SpeechEvent`]s, so events for a superseded utterance can be told apart
/// from events for the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

/// A single request to speak one phrase
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    /// Backend-specific voice identifier
    pub voice: Option<String>,
    /// Rate multiplier, 1.0 is the engine's normal speed
    pub rate: f32,
}

/// A voice offered by the speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub display_name: String,
    pub language: String,
}

impl Voice {
    /// Label shown in voice listings, e.g. "English (America) (en-us)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.language)
    }
}

/// Notifications reported by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The utterance began playing
    Started(UtteranceId),
    /// The utterance finished naturally (never sent for cancelled speech)
    Ended(UtteranceId),
    /// The voice list changed and should be re-read
    VoicesChanged,
}

/// Speech synthesizer trait
///
/// At most one utterance is in flight; `speak` replaces whatever is playing.
pub trait Synth: Send {
    /// Voices currently offered by the engine
    fn voices(&mut self) -> Result<Vec<Voice>>;

    /// Start speaking, interrupting any current utterance
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Pause the current utterance
    fn pause(&mut self) -> Result<()>;

    /// Resume a paused utterance
    fn resume(&mut self) -> Result<()>;

    /// Silence the current utterance without reporting it as ended
    fn cancel(&mut self) -> Result<()>;

    /// Drain events that happened since the last call
    fn poll_events(&mut self) -> Vec<SpeechEvent>;
}

/// Which backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// espeak-ng if installed, otherwise the native engine
    Auto,
    Native,
    Espeak,
    Silent,
}

impl Backend {
    /// Parse a backend name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Some(Backend::Auto),
            "native" | "tts" => Some(Backend::Native),
            "espeak" | "espeak-ng" => Some(Backend::Espeak),
            "silent" | "none" => Some(Backend::Silent),
            _ => None,
        }
    }
}

/// Create a speech synthesizer
///
/// **Auto:**
/// 1. espeak-ng subprocess (supports pause and resume)
/// 2. Native engine via the tts crate (Speech Dispatcher, AVFoundation, ...)
///
/// The other variants construct exactly the named backend. The silent
/// backend times each utterance at `words_per_minute`.
pub fn create_synth(backend: Backend, words_per_minute: f32) -> Result<Box<dyn Synth>> {
    use super::backends::espeak::EspeakSynth;
    use super::backends::native::NativeSynth;
    use super::backends::silent::SilentSynth;

    match backend {
        Backend::Native => Ok(Box::new(NativeSynth::new()?)),
        Backend::Espeak => Ok(Box::new(EspeakSynth::new()?)),
        Backend::Silent => {
            info!("Using silent speech backend");
            Ok(Box::new(SilentSynth::new(words_per_minute)))
        }
        Backend::Auto => {
            info!("Trying espeak-ng backend...");
            let espeak_err = match EspeakSynth::new() {
                Ok(synth) => {
                    info!("✓ Successfully initialized espeak-ng backend");
                    return Ok(Box::new(synth));
                }
                Err(e) => {
                    info!("✗ espeak-ng backend unavailable: {}", e);
                    e
                }
            };

            info!("Trying native TTS backend...");
            match NativeSynth::new() {
                Ok(synth) => {
                    info!("✓ Successfully initialized native TTS backend");
                    Ok(Box::new(synth))
                }
                Err(e) => Err(TrainerError::Speech(format!(
                    "No speech backend available. Tried:\n\
                     1. espeak-ng (install: sudo apt install espeak-ng): {}\n\
                     2. Native TTS (install: sudo apt install speech-dispatcher): {}\n\
                     Set backend = silent in ~/.ptrain.cfg to run without audio",
                    espeak_err, e
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::from_name("auto"), Some(Backend::Auto));
        assert_eq!(Backend::from_name(""), Some(Backend::Auto));
        assert_eq!(Backend::from_name("Native"), Some(Backend::Native));
        assert_eq!(Backend::from_name("espeak-ng"), Some(Backend::Espeak));
        assert_eq!(Backend::from_name(" silent "), Some(Backend::Silent));
        assert_eq!(Backend::from_name("festival"), None);
    }

    #[test]
    fn test_voice_label() {
        let voice = Voice {
            id: "en-us".to_string(),
            display_name: "English (America)".to_string(),
            language: "en-us".to_string(),
        };
        assert_eq!(voice.label(), "English (America) (en-us)");
    }

    #[test]
    fn test_create_silent_synth() {
        let synth = create_synth(Backend::Silent, 150.0);
        assert!(synth.is_ok());
    }
}
