use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use tracing::info;

use flappy_trail::app::{App, LoopSettings};
use flappy_trail::audio::Audio;
use flappy_trail::config::{self, GameConfig};
use flappy_trail::game::GameState;
use flappy_trail::logger::{EventKind, EventLogger};
use flappy_trail::metadata::{self, SessionMetadata};
use flappy_trail::physics::PipeSpawner;
use flappy_trail::platform::{self, TerminalGuard};

#[derive(Parser, Debug)]
#[command(version, about = "Flappy Bird in the terminal, with a CSV event trail")]
struct Cli {
    /// Skips the metadata form when any of the three metadata flags is set.
    #[arg(long)]
    subject_id: Option<String>,
    #[arg(long)]
    simulator_run: Option<String>,
    #[arg(long)]
    comments: Option<String>,

    /// Where trail files and the diagnostic log are written.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Directory holding sfx_wing.wav, sfx_hit.wav and sfx_point.wav.
    #[arg(long, default_value = "sound")]
    sound_dir: PathBuf,
    /// Seed for pipe heights. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = config::FPS)]
    fps: u32,
    /// World size in design units, WIDTHxHEIGHT.
    #[arg(long, default_value = "576x1024", value_parser = config::parse_world)]
    world: (f64, f64),
    /// Shows each trail record in the corner for a second.
    #[arg(long)]
    debug: bool,
    #[arg(long)]
    mute: bool,
}

impl Cli {
    fn metadata(&self) -> Option<SessionMetadata> {
        if self.subject_id.is_none() && self.simulator_run.is_none() && self.comments.is_none() {
            return None;
        }
        Some(SessionMetadata::new(
            self.subject_id.clone().unwrap_or_default(),
            self.simulator_run.clone().unwrap_or_default(),
            self.comments.clone().unwrap_or_default(),
        ))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::init_file_tracing(&cli.data_dir);
    platform::install_termination_handler();

    let mut out = TerminalGuard::enter().context("failed to set up the terminal")?;

    let meta = match cli.metadata() {
        Some(meta) => meta,
        None => match metadata::collect(&mut out)? {
            Some(meta) => meta,
            None => {
                info!("Metadata form cancelled");
                return Ok(());
            }
        },
    };

    let mut logger = EventLogger::open(&cli.data_dir, &meta);
    logger.record(EventKind::SessionInfo, Some(meta.info_payload().as_str()));
    info!(
        trail = %logger.path().display(),
        enabled = logger.is_enabled(),
        subject_id = %meta.subject_id,
        "Session started"
    );

    let audio = Audio::new(&cli.sound_dir, cli.mute);
    info!(enabled = audio.is_enabled(), "Audio ready");

    let (width, height) = cli.world;
    let state = GameState::new(GameConfig::for_world(width, height));
    let settings = LoopSettings {
        fps: cli.fps,
        debug_overlay: cli.debug,
    };
    let mut app = App::new(
        state,
        logger,
        audio,
        PipeSpawner::new(cli.seed),
        settings,
        terminal::size()?,
    );
    app.run(&mut out)?;
    Ok(())
}
