//! ptrain - terminal pronunciation trainer
//!
//! Keeps a list of short phrases, reads them aloud through the platform's
//! text-to-speech engine one at a time or all in sequence, and reports
//! estimated progress while speaking.

pub mod error;
pub mod input;
pub mod playback;
pub mod speech;
pub mod state;
pub mod store;
pub mod terminal;
pub mod view;

pub use error::{Result, TrainerError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "ptrain";
