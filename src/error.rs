//! Error types for the game and the supervisor.
//!
//! None of these ever reach the player: the game loop degrades instead of
//! failing (silent audio, disabled trail), and the supervisor logs and retries.

use std::io;

/// Errors raised inside the game process.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("No audio output: {0}")]
    Stream(#[from] rodio::StreamError),

    #[error("Failed to open sound: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to decode sound: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),

    #[error("Sound has no samples")]
    Empty,
}

/// Errors talking to the flag store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Failed to read key {key}: {source}")]
    Read { key: String, source: io::Error },

    #[error("Failed to write key {key}: {source}")]
    Write { key: String, source: io::Error },
}

#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    #[error("Flag store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to launch game: {0}")]
    Launch(#[source] io::Error),

    #[error("Failed to stop game: {0}")]
    Stop(#[source] io::Error),
}

pub type GameResult<T> = Result<T, GameError>;
