//! Chirp Shot headless runner
//!
//! Loads a level, lets the autopilot play it out tick by tick and logs what
//! happened. Run with `RUST_LOG=debug` to see every shot.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use chirp_shot::autopilot::Autopilot;
use chirp_shot::driver::FrameDriver;
use chirp_shot::level::builtin_level;
use chirp_shot::sim::{GameEvent, ShotState};
use chirp_shot::{Level, Settings};

#[derive(Debug, Parser)]
#[command(author, version, about = "Play a Chirp Shot level with the autopilot", long_about = None)]
struct Args {
    /// Shipped level to play
    #[arg(long, default_value_t = 1, conflicts_with = "file")]
    level: u32,

    /// Level template in JSON instead of a shipped level
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Autopilot seed; the same seed replays the same game
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Settings JSON (missing or broken files fall back to defaults)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Give up if the level has not finished after this many ticks
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    dump: bool,
}

fn load_level(args: &Args) -> Result<Level> {
    match &args.file {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading level file {}", path.display()))?;
            Level::from_json(&json).with_context(|| format!("loading level from {}", path.display()))
        }
        None => match builtin_level(args.level) {
            Some(level) => Ok(level),
            None => bail!("no shipped level with id {}", args.level),
        },
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::ShotLaunched { velocity } => {
            log::info!("Launch at ({:.2}, {:.2})", velocity.x, velocity.y)
        }
        GameEvent::BlockDestroyed { id, points } => log::info!("Block {} destroyed (+{})", id, points),
        GameEvent::PigDestroyed { id, points } => log::info!("Pig {} destroyed (+{})", id, points),
        GameEvent::ShotEnded => log::debug!("Shot settled"),
        GameEvent::BirdReloaded { birds_remaining } => {
            log::info!("Bird reloaded, {} left", birds_remaining)
        }
        GameEvent::LevelCleared { score } => log::info!("Level cleared with score {}", score),
        GameEvent::LevelFailed { score } => log::info!("Level failed with score {}", score),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let level = load_level(&args)?;
    let settings = match &args.settings {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    log::info!(
        "Chirp Shot starting level {} ({} birds, {} pigs, support {})",
        level.id,
        level.bird_count,
        level.pigs.len(),
        settings.support.as_str()
    );

    let mut driver = FrameDriver::new(level, settings);
    let mut pilot = Autopilot::new(args.seed);

    while !driver.session().state.is_terminal() {
        if driver.session().state == ShotState::Ready && !pilot.take_shot(driver.session_mut()) {
            bail!("autopilot could not find a shot in level {}", driver.level().id);
        }

        while let Some(ticket) = driver.schedule() {
            driver.run_frame(ticket);
            for event in driver.drain_events() {
                log_event(&event);
            }
            if driver.session().time_ticks >= args.max_ticks {
                bail!("level {} still running after {} ticks", driver.level().id, args.max_ticks);
            }
        }
    }

    let snapshot = driver.session().snapshot();
    log::info!(
        "Finished level {}: {:?} with score {} after {} ticks",
        driver.level().id,
        snapshot.state,
        snapshot.score,
        snapshot.tick
    );
    if args.dump {
        println!("{}", serde_json::to_string_pretty(&snapshot).context("serializing snapshot")?);
    }
    Ok(())
}
