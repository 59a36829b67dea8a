//! ptrain main entry point
//!
//! The main loop waits on two sources:
//! 1. stdin (user keyboard input) - fed to the key handler stack
//! 2. A timeout - lets the speech engine report progress and completion
//!
//! SIGWINCH only sets a flag; the loop picks up the new size.

use anyhow::{bail, Context};
use log::{debug, error, info};
use mio::{Events, Interest, Poll, Token};
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use ptrain::input::{create_default_keymap, HandlerStack, LineHandler};
use ptrain::state::config::Config;
use ptrain::state::State;
use ptrain::terminal::{get_terminal_size, is_terminal, RawModeGuard};
use ptrain::view::{self, Renderer};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Token for stdin in mio poll
const STDIN: Token = Token(0);

/// Longest the loop sleeps, so resizes are noticed promptly
const MAX_WAIT: Duration = Duration::from_millis(100);

/// Global flag set by SIGWINCH handler
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// SIGWINCH handler - sets flag when terminal is resized
extern "C" fn handle_sigwinch(_: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("{} {}", ptrain::APP_NAME, ptrain::VERSION);
        return;
    }
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    if debug_mode {
        // Debug mode: write to ptrain.log, stderr belongs to the UI
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("ptrain.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open ptrain.log for debug logging: {}", e);
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "ptrain version {} starting (debug mode, logging to ptrain.log)",
            ptrain::VERSION
        );
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        eprintln!("ptrain: {:#}", e);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    if !is_terminal() {
        bail!("an interactive terminal is required (stdin is not a TTY)");
    }

    let config = Config::load().context("loading configuration")?;
    info!("Config loaded from {:?}", config.path());

    let mut state = State::new(&config).context("starting speech and phrase storage")?;

    let (cols, rows) = get_terminal_size();
    info!("Terminal size: {}x{}", cols, rows);

    // Restores the terminal on every exit path, including errors below
    let _raw = RawModeGuard::enable().context("switching the terminal to raw mode")?;

    unsafe {
        signal::signal(Signal::SIGWINCH, SigHandler::Handler(handle_sigwinch))
            .context("installing the SIGWINCH handler")?;
    }

    let mut handlers = HandlerStack::new();
    let keymap = create_default_keymap();
    info!("Line editor initialized with {} hotkeys", keymap.len());
    handlers.push(Box::new(LineHandler::new(keymap)));

    let stdin_fd = io::stdin().as_raw_fd();
    let mut poll = Poll::new()?;
    poll.registry().register(
        &mut mio::unix::SourceFd(&stdin_fd),
        STDIN,
        Interest::READABLE,
    )?;
    let mut events = Events::with_capacity(16);

    let mut renderer = Renderer::new(cols);
    let mut stdout = io::stdout();
    state.print(format!(
        "{} {} - type a phrase and press Enter to add it, or 'help' for commands",
        ptrain::APP_NAME,
        ptrain::VERSION
    ));

    info!("ptrain ready - entering event loop");

    loop {
        if RESIZE_PENDING.swap(false, Ordering::Relaxed) {
            let (new_cols, new_rows) = get_terminal_size();
            info!("Terminal resized to {}x{}", new_cols, new_rows);
            renderer.resize(new_cols);
        }

        let now = Instant::now();
        state.update(now);

        let lines = state.take_output();
        let status = view::status_line(&state, renderer.width());
        renderer.render(&mut stdout, &lines, &status, &handlers.prompt())?;

        if state.quit {
            break;
        }

        let timeout = state
            .time_until_next_update(now)
            .map_or(MAX_WAIT, |d| d.min(MAX_WAIT));

        if let Err(e) = poll.poll(&mut events, Some(timeout)) {
            if e.kind() == io::ErrorKind::Interrupted {
                debug!("poll interrupted by signal");
                continue;
            }
            return Err(e).context("waiting for input");
        }

        for event in events.iter() {
            if event.token() == STDIN && !handle_stdin(stdin_fd, &mut handlers, &mut state)? {
                info!("stdin closed");
                state.quit = true;
            }
        }
    }

    info!("Shutting down");
    state.stop_all(Instant::now());
    renderer.finish(&mut stdout)?;
    Ok(())
}

/// Feed one chunk of keyboard input to the handler stack
///
/// Reads the descriptor directly so no bytes are left behind in a buffer
/// the poller cannot see. Returns false at end of input.
fn handle_stdin(
    stdin_fd: RawFd,
    handlers: &mut HandlerStack,
    state: &mut State,
) -> anyhow::Result<bool> {
    let mut buf = [0u8; 4096];

    let n = match nix::unistd::read(stdin_fd, &mut buf) {
        Ok(n) => n,
        Err(nix::errno::Errno::EINTR) | Err(nix::errno::Errno::EAGAIN) => return Ok(true),
        Err(e) => return Err(e).context("reading keyboard input"),
    };
    if n == 0 {
        return Ok(false);
    }

    if let Err(e) = handlers.process(&buf[..n], state, Instant::now()) {
        error!("Key handler failed: {}", e);
    }
    Ok(true)
}
