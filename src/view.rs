//! Console rendering
//!
//! Output is line-oriented: command results scroll up the terminal and a
//! two-line footer (status line, prompt line) stays at the bottom. The
//! footer is only redrawn when its content changes.

use crate::playback::PlaybackMode;
use crate::state::State;
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const BAR_WIDTH: usize = 10;

/// Truncate `text` to `width` display columns, marking the cut with an ellipsis
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Keep the end of `text` visible within `width` columns
fn fit_tail(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut kept: Vec<char> = Vec::new();
    let mut used = 0;
    for c in text.chars().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        kept.push(c);
        used += w;
    }
    let mut out = String::from("…");
    out.extend(kept.into_iter().rev());
    out
}

/// `[####------]` for a percentage
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Text of the active phrase, taken from the play-all snapshot when one is running
fn active_text(state: &State) -> Option<String> {
    let sequencer = state.sequencer();
    if let Some(queue) = sequencer.queue() {
        return queue.items().get(queue.cursor()).cloned();
    }
    let index = sequencer.active_index()?;
    state.phrases().get(index).map(str::to_string)
}

/// Status line: the current notice, else playback progress, else a summary
pub fn status_line(state: &State, width: usize) -> String {
    if let Some(notice) = state.notice() {
        return fit(&notice.to_string(), width);
    }

    let glyph = match state.mode() {
        PlaybackMode::Idle => {
            let voice = state
                .current_voice()
                .map(|v| v.label())
                .unwrap_or_else(|| "no voice".to_string());
            let summary = format!(
                "{} phrases | rate {:.1} | {} | type help for commands",
                state.phrases().len(),
                state.rate(),
                voice
            );
            return fit(&summary, width);
        }
        PlaybackMode::Speaking => "▶",
        PlaybackMode::Paused => "⏸",
    };

    let position = match (state.sequencer().queue(), state.active_index()) {
        (Some(queue), _) => format!("{}/{}", queue.cursor() + 1, queue.len()),
        (None, Some(index)) => format!("{}/{}", index + 1, state.phrases().len()),
        (None, None) => String::new(),
    };
    let t = state.telemetry();
    let progress = format!(
        "{} {:.1}s / ~{:.1}s left",
        progress_bar(t.progress_percent, BAR_WIDTH),
        t.elapsed_seconds,
        t.remaining_seconds
    );

    let fixed = glyph.width() + position.width() + progress.width() + 5;
    let text = active_text(state).unwrap_or_default();
    let text = fit(&text, width.saturating_sub(fixed).max(8));
    fit(&format!("{} {} \"{}\" {}", glyph, position, text, progress), width)
}

/// Numbered phrase list, marking the active phrase
pub fn phrase_lines(state: &State) -> Vec<String> {
    if state.phrases().is_empty() {
        return vec!["No phrases yet. Type one and press Enter.".to_string()];
    }
    let active = state.active_index().filter(|_| !state.is_playing_all());
    state
        .phrases()
        .phrases()
        .iter()
        .enumerate()
        .map(|(i, text)| {
            if active != Some(i) {
                return format!("   {:>2}. {}", i + 1, text);
            }
            let marker = if state.mode() == PlaybackMode::Paused { "⏸" } else { "▶" };
            let t = state.telemetry();
            format!(
                " {} {:>2}. {}  {} {:.0}%",
                marker,
                i + 1,
                text,
                progress_bar(t.progress_percent, BAR_WIDTH),
                t.progress_percent
            )
        })
        .collect()
}

/// Numbered voice list, marking the voice in use
pub fn voice_lines(state: &State) -> Vec<String> {
    if state.voices().is_empty() {
        return vec!["No voices available".to_string()];
    }
    let current = state.current_voice().map(|v| v.id.clone());
    state
        .voices()
        .iter()
        .enumerate()
        .map(|(i, voice)| {
            let marker = if current.as_deref() == Some(voice.id.as_str()) { "*" } else { " " };
            format!(" {} {:>2}. {}", marker, i + 1, voice.label())
        })
        .collect()
}

/// Draws output lines and the footer in raw mode
pub struct Renderer {
    width: usize,
    footer: Option<(String, String)>,
}

impl Renderer {
    pub fn new(cols: u16) -> Self {
        Self {
            width: cols as usize,
            footer: None,
        }
    }

    /// Columns available to the footer; the last one is left free so lines never wrap
    pub fn width(&self) -> usize {
        self.width.saturating_sub(1).max(1)
    }

    /// New terminal width; forces the footer to be redrawn
    pub fn resize(&mut self, cols: u16) {
        self.width = cols as usize;
        if let Some(footer) = self.footer.as_mut() {
            footer.0.clear();
            footer.1.clear();
        }
    }

    /// Print `lines` above the footer and redraw it if anything changed
    pub fn render(
        &mut self,
        out: &mut impl Write,
        lines: &[String],
        status: &str,
        prompt: &str,
    ) -> io::Result<()> {
        let footer = (fit(status, self.width()), fit_tail(prompt, self.width()));
        if lines.is_empty() && self.footer.as_ref() == Some(&footer) {
            return Ok(());
        }

        let mut frame = String::new();
        if self.footer.is_some() {
            // Clear the prompt line, move up and clear the status line
            frame.push_str("\r\x1b[K\x1b[1A\r\x1b[K");
        }
        for line in lines {
            frame.push_str(line);
            frame.push_str("\r\n");
        }
        frame.push_str(&footer.0);
        frame.push_str("\r\n");
        frame.push_str(&footer.1);

        out.write_all(frame.as_bytes())?;
        out.flush()?;
        self.footer = Some(footer);
        Ok(())
    }

    /// Leave the cursor on a fresh line
    pub fn finish(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.footer.take().is_some() {
            out.write_all(b"\r\n")?;
            out.flush()?;
        }
        Ok(())
    }
}
