//! Terminal utilities

use crate::{Result, TrainerError};
use log::debug;
use nix::libc;
use nix::sys::termios::{self, SetArg, Termios};
use std::io::{self, IsTerminal};
use std::os::unix::io::AsRawFd;

/// Whether stdin is an interactive terminal
pub fn is_terminal() -> bool {
    io::stdin().is_terminal()
}

/// Terminal size of stdin as (columns, rows)
///
/// Falls back to 80x24 when the size cannot be read.
pub fn get_terminal_size() -> (u16, u16) {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(io::stdin().as_raw_fd(), libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 {
        (ws.ws_col, ws.ws_row)
    } else {
        (80, 24)
    }
}

/// Puts stdin in raw mode and restores the saved attributes on drop
///
/// Raw mode delivers every keypress immediately, including Esc and the
/// control keys used as hotkeys. Output post-processing is off too, so
/// lines must end in "\r\n".
pub struct RawModeGuard {
    original: Termios,
}

impl RawModeGuard {
    pub fn enable() -> Result<Self> {
        let stdin = io::stdin();
        let original = termios::tcgetattr(&stdin)
            .map_err(|e| TrainerError::Other(format!("Failed to read terminal attributes: {}", e)))?;

        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw)
            .map_err(|e| TrainerError::Other(format!("Failed to enter raw mode: {}", e)))?;

        debug!("Terminal in raw mode");
        Ok(Self { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &self.original);
        debug!("Terminal attributes restored");
    }
}
