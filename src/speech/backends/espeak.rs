//! espeak-ng subprocess backend
//!
//! Each utterance runs as its own `espeak-ng` process. Completion is
//! detected by reaping the child, and pause/resume are implemented with
//! job control signals, so this is the only audio backend that can pause.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)
//! - PulseAudio client libraries (pre-installed with WSLG on WSL)

use crate::speech::{SpeechEvent, Synth, Utterance, UtteranceId, Voice};
use crate::{Result, TrainerError};
use log::{debug, error, info, warn};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::{Child, Command, Stdio};

/// espeak-ng's own default speed, used for rate 1.0
const NORMAL_WPM: f32 = 175.0;

/// Row of `espeak-ng --voices`: priority, language, age/gender, name, file
static VOICE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\s+(\S+)\s+\S+\s+(\S+)\s+\S+").expect("valid voice row pattern")
});

/// Running espeak-ng process and the utterance it speaks
struct Running {
    id: UtteranceId,
    child: Child,
}

/// espeak-ng backend
pub struct EspeakSynth {
    /// Currently running espeak-ng process
    current: Option<Running>,

    /// Path to espeak-ng
    espeak_path: String,

    /// Events not yet handed to the caller
    pending: Vec<SpeechEvent>,
}

impl EspeakSynth {
    /// Create a new espeak-ng synthesizer
    ///
    /// Verifies espeak-ng is installed and PulseAudio is reachable
    pub fn new() -> Result<Self> {
        debug!("Creating espeak-ng backend");

        Self::setup_pulseaudio()?;

        let espeak_path = Self::find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);

        Ok(Self {
            current: None,
            espeak_path,
            pending: vec![SpeechEvent::VoicesChanged],
        })
    }

    /// Detect if running in WSL (Windows Subsystem for Linux)
    fn is_wsl() -> bool {
        if let Ok(contents) = std::fs::read_to_string("/proc/version") {
            let lower = contents.to_lowercase();
            if lower.contains("microsoft") || lower.contains("wsl") {
                return true;
            }
        }
        std::env::var("WSL_DISTRO_NAME").is_ok()
    }

    /// Point PulseAudio clients at the WSLG server when running under WSL
    fn setup_pulseaudio() -> Result<()> {
        const WSLG_PULSE_PATH: &str = "/mnt/wslg/PulseServer";

        if std::env::var("PULSE_SERVER").is_ok() || !Self::is_wsl() {
            return Ok(());
        }

        if std::path::Path::new(WSLG_PULSE_PATH).exists() {
            info!("Auto-detected WSLG PulseAudio server at {}", WSLG_PULSE_PATH);
            std::env::set_var("PULSE_SERVER", WSLG_PULSE_PATH);
            return Ok(());
        }

        warn!("WSLG PulseAudio server not found at {}", WSLG_PULSE_PATH);
        Err(TrainerError::Speech(
            "PulseAudio server not found. Install WSLg or set PULSE_SERVER environment variable."
                .to_string(),
        ))
    }

    /// Find espeak-ng executable
    fn find_espeak() -> Result<String> {
        for path in ["espeak-ng", "/usr/bin/espeak-ng"] {
            if let Ok(status) = Command::new(path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                if status.success() {
                    return Ok(path.to_string());
                }
            }
        }

        Err(TrainerError::Speech(
            "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
        ))
    }

    /// Convert a rate multiplier to espeak speed (80-450 wpm)
    fn rate_to_speed(rate: f32) -> u16 {
        (NORMAL_WPM * rate).round().clamp(80.0, 450.0) as u16
    }

    /// Parse the table printed by `espeak-ng --voices`
    fn parse_voices(listing: &str) -> Vec<Voice> {
        listing
            .lines()
            .skip(1)
            .filter_map(|line| VOICE_ROW.captures(line))
            .map(|caps| {
                let language = caps[1].to_string();
                Voice {
                    id: language.clone(),
                    display_name: caps[2].replace('_', " "),
                    language,
                }
            })
            .collect()
    }

    fn signal_child(&self, signal: Signal) -> Result<bool> {
        let Some(running) = &self.current else {
            return Ok(false);
        };
        let pid = Pid::from_raw(running.child.id() as i32);
        kill(pid, signal)
            .map_err(|e| TrainerError::Speech(format!("Failed to send {}: {}", signal, e)))?;
        Ok(true)
    }

    /// Cancel any currently running speech process
    fn cancel_process(&mut self) {
        if let Some(mut running) = self.current.take() {
            debug!("Killing espeak-ng process");
            match running.child.kill() {
                Ok(_) => {
                    let _ = running.child.wait();
                }
                Err(e) => debug!("Failed to kill espeak-ng process: {}", e),
            }
        }
    }
}

impl Synth for EspeakSynth {
    fn voices(&mut self) -> Result<Vec<Voice>> {
        let output = Command::new(&self.espeak_path)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()?;
        let listing = String::from_utf8(output.stdout)
            .map_err(|e| TrainerError::Speech(format!("Unreadable voice list: {}", e)))?;
        Ok(Self::parse_voices(&listing))
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.cancel_process();

        if utterance.text.is_empty() {
            return Ok(());
        }

        let mut cmd = Command::new(&self.espeak_path);
        if let Some(voice) = &utterance.voice {
            cmd.arg("-v").arg(voice);
        }
        cmd.arg("-s").arg(Self::rate_to_speed(utterance.rate).to_string());
        // "--" keeps phrases starting with a dash from being read as flags
        cmd.arg("--").arg(&utterance.text);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        debug!("Speaking: {}", utterance.text);
        match cmd.spawn() {
            Ok(child) => {
                self.current = Some(Running {
                    id: utterance.id,
                    child,
                });
                self.pending.push(SpeechEvent::Started(utterance.id));
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn espeak-ng: {}", e);
                Err(TrainerError::Speech(format!("Failed to start espeak-ng: {}", e)))
            }
        }
    }

    fn pause(&mut self) -> Result<()> {
        if self.signal_child(Signal::SIGSTOP)? {
            debug!("espeak-ng paused");
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if self.signal_child(Signal::SIGCONT)? {
            debug!("espeak-ng resumed");
        }
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.cancel_process();
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<SpeechEvent> {
        if let Some(running) = self.current.as_mut() {
            match running.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("espeak-ng exited with {}", status);
                    self.pending.push(SpeechEvent::Ended(running.id));
                    self.current = None;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to poll espeak-ng: {}", e);
                    self.current = None;
                }
            }
        }
        std::mem::take(&mut self.pending)
    }
}

impl Drop for EspeakSynth {
    fn drop(&mut self) {
        debug!("Shutting down espeak-ng backend");
        self.cancel_process();
    }
}
