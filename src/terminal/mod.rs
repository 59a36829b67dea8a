//! Terminal control for the console front-end

pub mod util;

pub use util::{get_terminal_size, is_terminal, RawModeGuard};
