//! Command line editor
//!
//! The bottom handler of the stack. Collects typed text until Enter, then
//! parses it as a command. Hotkeys act immediately.

use super::keymap::{parse_command, Command, KeySequence, HELP};
use super::prompt_handler::ConfirmClearHandler;
use super::{HandlerAction, KeyHandler};
use crate::playback::PlaybackMode;
use crate::state::State;
use crate::view;
use crate::Result;
use log::{debug, trace};
use std::collections::HashMap;
use std::time::Instant;

/// Run a parsed command against the trainer state
pub fn execute(command: Command, state: &mut State, now: Instant) -> Result<HandlerAction> {
    debug!("Executing {:?}", command);
    match command {
        Command::Add(text) => {
            state.add_phrase(&text, now);
        }
        Command::List => {
            for line in view::phrase_lines(state) {
                state.print(line);
            }
        }
        Command::Say(index) => {
            state.speak_phrase(index, now);
        }
        Command::Delete(index) => match state.phrases().get(index).map(str::to_string) {
            Some(text) => {
                state.delete_phrase(index, &text, now);
            }
            None => state.warn("No such phrase", now),
        },
        Command::PlayAll => {
            state.play_all(now);
        }
        Command::Pause(Some(index)) => {
            state.pause_phrase(index, now);
        }
        Command::Pause(None) => {
            state.pause_all(now);
        }
        Command::Resume(Some(index)) => {
            state.resume_phrase(index, now);
        }
        Command::Resume(None) => {
            state.resume_all(now);
        }
        Command::TogglePause => match state.mode() {
            PlaybackMode::Speaking => {
                state.pause_all(now);
            }
            PlaybackMode::Paused => {
                state.resume_all(now);
            }
            PlaybackMode::Idle => {}
        },
        Command::Stop => state.stop_all(now),
        Command::Clear => {
            if state.request_clear(now) {
                return Ok(HandlerAction::Push(Box::new(ConfirmClearHandler::new())));
            }
        }
        Command::Rate(None) => {
            let line = format!("Speech rate {:.1}", state.rate());
            state.print(line);
        }
        Command::Rate(Some(rate)) => {
            let rate = state.set_rate(rate);
            state.print(format!("Speech rate set to {:.1}", rate));
        }
        Command::Voices => {
            for line in view::voice_lines(state) {
                state.print(line);
            }
        }
        Command::Voice(index) => {
            if state.select_voice(index, now) {
                if let Some(label) = state.current_voice().map(|v| v.label()) {
                    state.print(format!("Using voice {}", label));
                }
            }
        }
        Command::Help => {
            for line in HELP {
                state.print(*line);
            }
        }
        Command::Quit => state.quit = true,
    }
    Ok(HandlerAction::Handled)
}

/// Line editor with hotkeys
pub struct LineHandler {
    /// Text typed so far
    buffer: String,

    /// Single-key bindings
    keymap: HashMap<KeySequence, Command>,
}

impl LineHandler {
    pub fn new(keymap: HashMap<KeySequence, Command>) -> Self {
        debug!("Creating line handler with {} hotkeys", keymap.len());
        Self {
            buffer: String::new(),
            keymap,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Parse and run the buffered line
    fn submit(&mut self, state: &mut State, now: Instant) -> Result<HandlerAction> {
        let line = std::mem::take(&mut self.buffer);
        if line.trim().is_empty() {
            return Ok(HandlerAction::Handled);
        }
        match parse_command(&line) {
            Ok(command) => execute(command, state, now),
            Err(message) => {
                state.warn(&message, now);
                Ok(HandlerAction::Handled)
            }
        }
    }
}

impl KeyHandler for LineHandler {
    fn process(&mut self, key: &[u8], state: &mut State, now: Instant) -> Result<HandlerAction> {
        if let Some(command) = self.keymap.get(key).cloned() {
            trace!("Hotkey {:?}", key);
            return execute(command, state, now);
        }

        match key {
            // Ctrl-D quits on an empty line
            b"\x04" => {
                if self.buffer.is_empty() {
                    state.quit = true;
                }
                return Ok(HandlerAction::Handled);
            }
            // Ctrl-U clears the line
            b"\x15" => {
                self.buffer.clear();
                return Ok(HandlerAction::Handled);
            }
            // Arrow keys and other escape sequences are not supported
            [0x1b, ..] => {
                trace!("Ignoring escape sequence {:?}", key);
                return Ok(HandlerAction::Handled);
            }
            _ => {}
        }

        // A chunk may hold several keystrokes when text is pasted
        for c in String::from_utf8_lossy(key).chars() {
            match c {
                '\r' | '\n' => {
                    let action = self.submit(state, now)?;
                    if !matches!(action, HandlerAction::Handled) {
                        return Ok(action);
                    }
                }
                '\x08' | '\x7f' => {
                    self.buffer.pop();
                }
                c if c.is_control() => {}
                c => self.buffer.push(c),
            }
        }
        Ok(HandlerAction::Handled)
    }

    fn prompt(&self) -> String {
        format!("> {}", self.buffer)
    }
}
