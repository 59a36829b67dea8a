//! Input handling and key bindings
//!
//! The input system uses a stack-based handler architecture where handlers
//! can be pushed/popped to create modal prompts (clear confirmation, the
//! empty-list prompt) over the command line editor.

pub mod handler;
pub mod keymap;
pub mod line_handler;
pub mod prompt_handler;

pub use handler::{HandlerAction, HandlerStack, KeyHandler};
pub use keymap::{create_default_keymap, parse_command, Command};
pub use line_handler::{execute, LineHandler};
pub use prompt_handler::{ConfirmClearHandler, EmptyListHandler};
