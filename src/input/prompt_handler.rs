//! Modal prompts pushed over the line editor

use super::{HandlerAction, KeyHandler};
use crate::state::State;
use crate::Result;
use log::debug;
use std::time::Instant;

/// Asks before deleting every phrase
///
/// `y` clears the list and opens the empty-list prompt; any other key cancels.
pub struct ConfirmClearHandler;

impl Default for ConfirmClearHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmClearHandler {
    pub fn new() -> Self {
        Self
    }
}

impl KeyHandler for ConfirmClearHandler {
    fn process(&mut self, key: &[u8], state: &mut State, now: Instant) -> Result<HandlerAction> {
        match key {
            b"y" | b"Y" => {
                state.clear_phrases(now);
                if state.empty_prompt() {
                    return Ok(HandlerAction::Replace(Box::new(EmptyListHandler::new())));
                }
                Ok(HandlerAction::Remove)
            }
            _ => {
                debug!("Clear cancelled");
                Ok(HandlerAction::Remove)
            }
        }
    }

    fn prompt(&self) -> String {
        "Delete all phrases? This cannot be undone. [y/N]".to_string()
    }
}

/// Shown after the list was emptied, until the user presses a key
pub struct EmptyListHandler;

impl Default for EmptyListHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EmptyListHandler {
    pub fn new() -> Self {
        Self
    }
}

impl KeyHandler for EmptyListHandler {
    fn process(&mut self, _key: &[u8], state: &mut State, _now: Instant) -> Result<HandlerAction> {
        state.dismiss_empty_prompt();
        Ok(HandlerAction::Remove)
    }

    fn prompt(&self) -> String {
        "NO PHRASES! Your list is empty. Press any key, then type a phrase to add it.".to_string()
    }
}
