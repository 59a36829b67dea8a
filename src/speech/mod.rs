//! Speech synthesis system

pub mod synth;
pub mod backends;

pub use synth::{create_synth, Backend, SpeechEvent, Synth, Utterance, UtteranceId, Voice};
