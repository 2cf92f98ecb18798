//! A Flappy Bird clone for the terminal that writes every session to a CSV
//! event trail, plus a supervisor that starts and stops the game from a
//! shared on/off flag.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod geometry;
pub mod logger;
pub mod metadata;
pub mod physics;
pub mod platform;
pub mod render;
pub mod supervisor;
pub mod timer;
