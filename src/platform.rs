//! Terminal lifecycle, tracing setup and termination signals.

use std::fs::{self, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::sync::Mutex;

use crossterm::{cursor, event, execute, terminal};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Sends diagnostics to `<dir>/flappy-trail.log`; the terminal belongs to the
/// game. Falls back to discarding them if the file cannot be opened.
pub fn init_file_tracing(dir: &Path) {
    let file = fs::create_dir_all(dir).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("flappy-trail.log"))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter()).with_ansi(false);
    let _ = match file {
        Ok(file) => builder.with_writer(Mutex::new(file)).try_init(),
        Err(_) => builder.with_writer(io::sink).try_init(),
    };
}

pub fn init_stderr_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .try_init();
}

// ── Terminal ────────────────────────────────────────────────────────────────

/// Raw mode on the alternate screen with mouse capture, restored on drop.
pub struct TerminalGuard {
    out: Stdout,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
            event::EnableMouseCapture,
        )?;
        Ok(Self { out })
    }
}

impl Write for TerminalGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            event::DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        );
        let _ = terminal::disable_raw_mode();
    }
}

// ── Signals ─────────────────────────────────────────────────────────────────

#[cfg(unix)]
mod signal {
    use std::sync::atomic::{AtomicBool, Ordering};

    static TERMINATE: AtomicBool = AtomicBool::new(false);

    extern "C" fn on_terminate(_: libc::c_int) {
        TERMINATE.store(true, Ordering::SeqCst);
    }

    pub fn install() {
        let handler = on_terminate as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
        unsafe {
            libc::signal(libc::SIGTERM, handler);
        }
    }

    pub fn requested() -> bool {
        TERMINATE.load(Ordering::SeqCst)
    }
}

#[cfg(not(unix))]
mod signal {
    pub fn install() {}

    pub fn requested() -> bool {
        false
    }
}

/// Makes SIGTERM set a flag instead of killing the process, so the game can
/// log its `QUIT` record and restore the terminal.
pub fn install_termination_handler() {
    signal::install();
}

pub fn termination_requested() -> bool {
    signal::requested()
}
