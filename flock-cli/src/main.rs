use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use flock_cli::commands::parse_dimension;
use flock_cli::{Driver, Session};
use flock_core::{Bounds, Flock, TickCoordinator};
use flock_shared::FlockSettings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless flocking simulation", long_about = None)]
struct Args {
    /// JSON settings file; missing fields use the defaults
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Draw area width
    #[arg(long, default_value_t = 1000.0, value_parser = parse_dimension)]
    width: f64,

    /// Draw area height
    #[arg(long, default_value_t = 750.0, value_parser = parse_dimension)]
    height: f64,

    /// Refresh rate of the apply phase
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Stop after this many ticks (0 runs until quit)
    #[arg(short, long, default_value_t = 0)]
    ticks: u64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write every frame as a JSON line to this file ('-' for stdout)
    #[arg(short, long)]
    frames: Option<String>,

    /// Ignore neighbors outside the detection angle
    #[arg(long)]
    field_of_view: bool,

    /// Read control lines from stdin (set <parameter> <value>, bounds <w> <h>, show, quit)
    #[arg(short, long)]
    interactive: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn load_settings(path: Option<&PathBuf>) -> Result<FlockSettings> {
    let Some(path) = path else {
        return Ok(FlockSettings::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    FlockSettings::from_json(&json).with_context(|| format!("Invalid settings in {}", path.display()))
}

fn open_sink(target: &str) -> Result<Box<dyn Write + Send>> {
    if target == "-" {
        return Ok(Box::new(std::io::stdout()));
    }
    let file = File::create(target).with_context(|| format!("Failed to create {}", target))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let settings = load_settings(args.settings.as_ref())?;
    let bounds = Bounds::new(args.width, args.height);
    log::info!("Flock simulation starting...");
    log::info!("Draw area: {}x{}", bounds.width, bounds.height);
    log::info!("Population: {}", settings.population);

    let session = Arc::new(Session::new(settings, bounds, args.field_of_view));

    let mut flock = match args.seed {
        Some(seed) => Flock::seeded(seed),
        None => Flock::new(),
    };
    flock.resize_to(session.settings().population as usize, bounds);

    let coordinator = TickCoordinator::spawn(flock, Arc::clone(session.controls()))
        .context("Failed to start simulation")?;

    let mut driver = Driver::new(coordinator, args.fps);
    if let Some(target) = args.frames.as_deref() {
        driver = driver.with_sink(open_sink(target)?);
    }

    if args.interactive {
        session
            .spawn_stdin_reader()
            .context("Failed to start control reader")?;
    }

    driver.run(&session, args.ticks).context("Simulation error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_area_flags_must_be_positive() {
        assert!(Args::try_parse_from(["flock-sim", "--width", "0"]).is_err());
        assert!(Args::try_parse_from(["flock-sim", "--height", "-20"]).is_err());
        assert!(Args::try_parse_from(["flock-sim", "--width", "NaN"]).is_err());

        let args = Args::try_parse_from(["flock-sim", "--width", "320", "--height", "240"]).unwrap();
        assert_eq!(args.width, 320.0);
        assert_eq!(args.height, 240.0);

        let defaults = Args::try_parse_from(["flock-sim"]).unwrap();
        assert_eq!(defaults.width, 1000.0);
        assert_eq!(defaults.height, 750.0);
    }
}
