//! Session event trail.
//!
//! One CSV file per session, one row per state-changing event, flushed on
//! every write. The logger never fails the game: if the file cannot be
//! created or written it turns itself into a no-op and says so once through
//! `tracing`.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;
use tracing::{info, warn};

use crate::error::GameError;
use crate::metadata::SessionMetadata;

pub const HEADER: [&str; 5] = ["unix_timestamp", "timestamp", "attempt_id", "event", "additional_info"];

const FILE_STAMP: &[FormatItem<'static>] = format_description!("[year][month][day]_[hour][minute][second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SessionInfo,
    KeyPress,
    Collision,
    PipePassed,
    Quit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SessionInfo => "SESSION_INFO",
            EventKind::KeyPress => "KEY_PRESS",
            EventKind::Collision => "COLLISION",
            EventKind::PipePassed => "PIPE_PASSED",
            EventKind::Quit => "QUIT",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the trail, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    /// Seconds since the Unix epoch.
    pub unix_timestamp: f64,
    /// Milliseconds since the logger was opened.
    pub timestamp: u64,
    pub attempt_id: u32,
    pub event: String,
    pub additional_info: String,
}

pub struct EventLogger {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    started: Instant,
    attempt_id: u32,
    last_event: Option<(String, u64)>,
}

impl EventLogger {
    /// Opens `<dir>/<subject>_<run>_<YYYYMMDD_HHMMSS>.csv` and writes the header.
    pub fn open(dir: impl AsRef<Path>, meta: &SessionMetadata) -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let stamp = now.format(FILE_STAMP).unwrap_or_else(|_| now.unix_timestamp().to_string());
        let name = format!(
            "{}_{}_{}.csv",
            file_safe(&meta.subject_id),
            file_safe(&meta.simulator_run),
            stamp
        );
        let path = dir.as_ref().join(name);

        let writer = match create_trail(dir.as_ref(), &path) {
            Ok(writer) => {
                info!(path = %path.display(), "Event logging initialized");
                Some(writer)
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Could not initialize event logger; logging disabled");
                None
            }
        };

        Self {
            path,
            writer,
            started: Instant::now(),
            attempt_id: 0,
            last_event: None,
        }
    }

    /// A logger that drops every record.
    pub fn disabled() -> Self {
        Self {
            path: PathBuf::new(),
            writer: None,
            started: Instant::now(),
            attempt_id: 0,
            last_event: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn attempt_id(&self) -> u32 {
        self.attempt_id
    }

    pub fn set_attempt(&mut self, attempt_id: u32) {
        self.attempt_id = attempt_id;
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Last logged message and when it was logged, for the debug overlay.
    pub fn last_event(&self) -> Option<(&str, u64)> {
        self.last_event.as_ref().map(|(msg, at)| (msg.as_str(), *at))
    }

    pub fn record(&mut self, kind: EventKind, payload: Option<&str>) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let unix_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        let timestamp = self.started.elapsed().as_millis() as u64;
        let row = EventRow {
            unix_timestamp,
            timestamp,
            attempt_id: self.attempt_id,
            event: kind.as_str().to_owned(),
            additional_info: payload.unwrap_or_default().to_owned(),
        };

        let written = writer
            .serialize(&row)
            .map_err(GameError::from)
            .and_then(|()| writer.flush().map_err(GameError::from));
        if let Err(error) = written {
            warn!(path = %self.path.display(), %error, "Failed to log event; logging disabled");
            self.writer = None;
            return;
        }

        let message = match payload {
            Some(info) if !info.is_empty() => format!("Attempt {}: {}: {}", self.attempt_id, kind, info),
            _ => kind.as_str().to_owned(),
        };
        self.last_event = Some((message, timestamp));
    }

    /// Flushes and releases the file. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            match writer.flush() {
                Ok(()) => info!(path = %self.path.display(), "Event logging completed"),
                Err(error) => warn!(path = %self.path.display(), %error, "Error closing event logger"),
            }
        }
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn create_trail(dir: &Path, path: &Path) -> Result<csv::Writer<File>, GameError> {
    fs::create_dir_all(dir)?;
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(HEADER)?;
    writer.flush()?;
    Ok(writer)
}

fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Reads a trail written by [`EventLogger`] back into rows.
pub fn read_trail(path: impl AsRef<Path>) -> Result<Vec<EventRow>, GameError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<EventRow>, _>>()?;
    Ok(rows)
}
