//! Transient status notices and view-facing events

use std::fmt;
use std::time::{Duration, Instant};

/// How long a notice stays visible
pub const NOTICE_DURATION: Duration = Duration::from_millis(1800);

/// Icon hint for a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeIcon {
    Speaking,
    Paused,
    Resumed,
    Stopped,
    Added,
    Deleted,
    Cleared,
    Finished,
    Warning,
    Empty,
}

impl NoticeIcon {
    /// Glyph drawn in front of the message
    pub fn glyph(self) -> &'static str {
        match self {
            NoticeIcon::Speaking => "🔊",
            NoticeIcon::Paused => "⏸",
            NoticeIcon::Resumed => "▶",
            NoticeIcon::Stopped => "⏹",
            NoticeIcon::Added => "+",
            NoticeIcon::Deleted | NoticeIcon::Cleared => "🗑",
            NoticeIcon::Finished => "✅",
            NoticeIcon::Warning => "⚠",
            NoticeIcon::Empty => "✎",
        }
    }
}

/// A short status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub icon: NoticeIcon,
    pub message: String,
}

impl Notice {
    pub fn new(icon: NoticeIcon, message: impl Into<String>) -> Self {
        Self {
            icon,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon.glyph(), self.message)
    }
}

/// Events the core emits for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Transient toast, auto-dismissed
    Status(Notice),
    /// The phrase list was emptied; prompt the user to add phrases
    EmptyList,
}

/// Holds the latest notice until it expires
///
/// A newer notice replaces the current one and restarts the clock.
#[derive(Debug)]
pub struct NoticeBoard {
    current: Option<(Notice, Instant)>,
    duration: Duration,
}

impl NoticeBoard {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn post(&mut self, notice: Notice, now: Instant) {
        self.current = Some((notice, now + self.duration));
    }

    /// Drop the notice if its time is up
    pub fn expire(&mut self, now: Instant) {
        if matches!(&self.current, Some((_, deadline)) if now >= *deadline) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref().map(|(notice, _)| notice)
    }

    /// When the current notice will disappear
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|(_, deadline)| *deadline)
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(NOTICE_DURATION)
    }
}
