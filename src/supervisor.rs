//! Starts and stops the game process from a remote on/off flag.
//!
//! The supervisor polls a [`FlagStore`] at a fixed interval. While the flag is
//! truthy it keeps one game process alive (launching it with the session
//! metadata found in the store) and writes a heartbeat; when the flag drops
//! it asks the game to stop, and kills it if it is still running after the
//! grace period.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::error::{StoreError, SupervisorError};
use crate::metadata::SessionMetadata;

pub const GAME_ON_KEY: &str = "flappy_bird:game_on";
pub const HEARTBEAT_KEY: &str = "flappy_bird:heartbeat_time";
pub const SUBJECT_ID_KEY: &str = "flappy_bird:subject_id";
pub const SIMULATOR_RUN_KEY: &str = "flappy_bird:simulator_run";
pub const COMMENTS_KEY: &str = "flappy_bird:comments";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const EXIT_CHECK_INTERVAL: Duration = Duration::from_millis(25);

/// `1`, `true` or `yes`, case-insensitively. Anything else is off.
pub fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

// ── Flag store ──────────────────────────────────────────────────────────────

pub trait FlagStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per key under a shared directory, e.g. on a network mount.
/// Values are trimmed on read. A missing file is an unset key.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        self.root.join(name)
    }
}

impl FlagStore for DirStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value.trim().to_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        // Write then rename so readers never see a half-written value.
        let tmp = path.with_extension("tmp");
        fs::create_dir_all(&self.root)
            .and_then(|()| fs::write(&tmp, value))
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|source| StoreError::Write {
                key: key.to_owned(),
                source,
            })
    }
}

// ── Child process ───────────────────────────────────────────────────────────

pub trait GameProcess {
    fn is_running(&mut self) -> bool;
    /// Asks the process to exit on its own.
    fn request_stop(&mut self) -> io::Result<()>;
    fn kill(&mut self) -> io::Result<()>;
    /// Reaps the exited process.
    fn wait(&mut self) -> io::Result<()>;
}

impl GameProcess for Child {
    fn is_running(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }

    #[cfg(unix)]
    fn request_stop(&mut self) -> io::Result<()> {
        let pid = libc::pid_t::try_from(self.id()).map_err(io::Error::other)?;
        // SAFETY: plain syscall on a pid we own and have not reaped yet.
        if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn request_stop(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<()> {
        Child::wait(self).map(|_| ())
    }
}

pub trait Launcher {
    type Process: GameProcess;
    fn launch(&mut self, meta: &SessionMetadata) -> io::Result<Self::Process>;
}

/// Spawns the game binary with the session metadata as flags.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }

    pub fn args(&self, meta: &SessionMetadata) -> Vec<String> {
        let mut args = vec![
            "--subject-id".to_owned(),
            meta.subject_id.clone(),
            "--simulator-run".to_owned(),
            meta.simulator_run.clone(),
            "--comments".to_owned(),
            meta.comments.clone(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl Launcher for CommandLauncher {
    type Process = Child;

    fn launch(&mut self, meta: &SessionMetadata) -> io::Result<Child> {
        Command::new(&self.program).args(self.args(meta)).spawn()
    }
}

/// Next to the running executable, the way cargo lays out binaries.
pub fn sibling_binary(name: &str) -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or(Path::new("."));
    Ok(dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX)))
}

// ── Supervisor ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    Idle,
    Started,
    Stopped(StopKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// Exited within the grace period.
    Graceful,
    Killed,
}

pub struct Supervisor<S: FlagStore, L: Launcher> {
    store: S,
    launcher: L,
    child: Option<L::Process>,
    grace: Duration,
}

impl<S: FlagStore, L: Launcher> Supervisor<S, L> {
    pub fn new(store: S, launcher: L, grace: Duration) -> Self {
        Self {
            store,
            launcher,
            child: None,
            grace,
        }
    }

    pub fn store(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn is_running(&mut self) -> bool {
        self.child.as_mut().is_some_and(|c| c.is_running())
    }

    fn read_metadata(&mut self) -> Result<SessionMetadata, StoreError> {
        let meta = SessionMetadata::new(
            self.store.get(SUBJECT_ID_KEY)?.unwrap_or_default(),
            self.store.get(SIMULATOR_RUN_KEY)?.unwrap_or_default(),
            self.store.get(COMMENTS_KEY)?.unwrap_or_default(),
        );
        info!(
            subject_id = %meta.subject_id,
            simulator_run = %meta.simulator_run,
            comments = %meta.comments,
            "Session metadata"
        );
        Ok(meta)
    }

    /// One iteration of the control loop.
    pub fn poll_once(&mut self) -> Result<PollAction, SupervisorError> {
        let flag = is_truthy(self.store.get(GAME_ON_KEY)?.as_deref());
        let running = self.is_running();

        if running {
            // A stale heartbeat must not keep the game from being stopped.
            if let Err(error) = self.store.set(HEARTBEAT_KEY, &unix_now().to_string()) {
                warn!(%error, "Heartbeat write failed");
            }
        } else if self.child.is_some() {
            // Exited on its own (player quit): reap it.
            if let Some(mut child) = self.child.take() {
                let _ = child.wait();
            }
            info!("Game exited");
        }

        if flag && !running {
            info!("Flag is on, starting game");
            let meta = self.read_metadata()?;
            let child = self.launcher.launch(&meta).map_err(SupervisorError::Launch)?;
            self.child = Some(child);
            return Ok(PollAction::Started);
        }
        if !flag && running {
            info!("Flag is off, stopping game");
            let kind = self.stop()?;
            return Ok(PollAction::Stopped(kind));
        }
        Ok(PollAction::Idle)
    }

    /// Asks the child to exit, then kills it once the grace period runs out.
    pub fn stop(&mut self) -> Result<StopKind, SupervisorError> {
        let Some(mut child) = self.child.take() else {
            return Ok(StopKind::Graceful);
        };

        if let Err(error) = child.request_stop() {
            warn!(%error, "Graceful stop request failed");
        }
        let deadline = Instant::now() + self.grace;
        while Instant::now() < deadline {
            if !child.is_running() {
                child.wait().map_err(SupervisorError::Stop)?;
                return Ok(StopKind::Graceful);
            }
            thread::sleep(EXIT_CHECK_INTERVAL.min(self.grace));
        }
        if !child.is_running() {
            child.wait().map_err(SupervisorError::Stop)?;
            return Ok(StopKind::Graceful);
        }

        warn!(grace = ?self.grace, "Game did not exit in time, killing it");
        child.kill().map_err(SupervisorError::Stop)?;
        child.wait().map_err(SupervisorError::Stop)?;
        Ok(StopKind::Killed)
    }

    /// Polls forever. Errors are logged and the next poll retries.
    pub fn run(&mut self, interval: Duration) -> ! {
        info!(?interval, grace = ?self.grace, "Supervisor running");
        loop {
            if let Err(error) = self.poll_once() {
                error!(%error, "Poll failed");
            }
            thread::sleep(interval);
        }
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
