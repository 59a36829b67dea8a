//! Key handler system with modal input support

use crate::state::State;
use crate::Result;
use std::fmt;
use std::time::Instant;

/// Action to take after processing a key
pub enum HandlerAction {
    /// Not for this handler; offer the key to the one below
    Passthrough,
    /// Remove this handler from the stack
    Remove,
    /// Key was handled, do nothing more
    Handled,
    /// Open a modal handler on top of this one
    Push(Box<dyn KeyHandler>),
    /// Close this handler and open another in its place
    Replace(Box<dyn KeyHandler>),
}

impl fmt::Debug for HandlerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passthrough => write!(f, "Passthrough"),
            Self::Remove => write!(f, "Remove"),
            Self::Handled => write!(f, "Handled"),
            Self::Push(_) => write!(f, "Push(..)"),
            Self::Replace(_) => write!(f, "Replace(..)"),
        }
    }
}

/// A key handler processes keyboard input
pub trait KeyHandler {
    /// Process a key sequence with access to the trainer state
    fn process(&mut self, key: &[u8], state: &mut State, now: Instant) -> Result<HandlerAction>;

    /// Prompt line shown while this handler is on top
    fn prompt(&self) -> String;
}

/// Stack of key handlers (last one processes input first)
pub struct HandlerStack {
    handlers: Vec<Box<dyn KeyHandler>>,
}

impl HandlerStack {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn push(&mut self, handler: Box<dyn KeyHandler>) {
        self.handlers.push(handler);
    }

    pub fn pop(&mut self) -> Option<Box<dyn KeyHandler>> {
        self.handlers.pop()
    }

    /// Offer a key to the handlers from the top down until one takes it
    ///
    /// Stack changes requested by the handler are applied before returning.
    /// Returns false when every handler passed.
    pub fn process(&mut self, key: &[u8], state: &mut State, now: Instant) -> Result<bool> {
        for depth in (0..self.handlers.len()).rev() {
            let action = self.handlers[depth].process(key, state, now)?;
            match action {
                HandlerAction::Passthrough => continue,
                HandlerAction::Handled => {}
                HandlerAction::Remove => {
                    self.handlers.remove(depth);
                }
                HandlerAction::Push(handler) => self.handlers.push(handler),
                HandlerAction::Replace(handler) => self.handlers[depth] = handler,
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Prompt of the top handler
    pub fn prompt(&self) -> String {
        self.handlers
            .last()
            .map(|handler| handler.prompt())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerStack {
    fn default() -> Self {
        Self::new()
    }
}
