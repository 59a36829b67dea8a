//! Platform-specific speech backends

// Native TTS backend using the tts crate (cross-platform)
pub mod native;

// espeak-ng subprocess backend, with pause via job control signals
pub mod espeak;

// Audio-free backend that only keeps time
pub mod silent;
