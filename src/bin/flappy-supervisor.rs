use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use flappy_trail::platform;
use flappy_trail::supervisor::{self, CommandLauncher, DirStore, Supervisor};

#[derive(Parser, Debug)]
#[command(version, about = "Starts and stops flappy-trail from a shared on/off flag")]
struct Cli {
    /// Directory with one file per flag key.
    #[arg(long, default_value = "flags")]
    store_dir: PathBuf,
    /// Seconds between polls.
    #[arg(long, default_value_t = supervisor::DEFAULT_POLL_INTERVAL.as_secs_f64())]
    interval: f64,
    /// Seconds the game gets to exit before it is killed.
    #[arg(long, default_value_t = 1.0)]
    grace: f64,
    /// Game binary. Defaults to flappy-trail next to this executable.
    #[arg(long)]
    game_bin: Option<PathBuf>,
    /// Extra arguments passed to the game after the metadata flags.
    #[arg(last = true)]
    game_args: Vec<String>,
}

fn seconds(value: f64, name: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid --{name} {value}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::init_stderr_tracing();

    let interval = seconds(cli.interval, "interval")?;
    let grace = seconds(cli.grace, "grace")?;
    let game_bin = match cli.game_bin {
        Some(path) => path,
        None => supervisor::sibling_binary("flappy-trail").context("cannot locate the game binary")?,
    };
    info!(store = %cli.store_dir.display(), game = %game_bin.display(), "Starting supervisor");

    let store = DirStore::new(cli.store_dir);
    let launcher = CommandLauncher::new(game_bin, cli.game_args);
    Supervisor::new(store, launcher, grace).run(interval)
}
