use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flock_core::{Frame, TickCoordinator};

use crate::session::Session;
use crate::snapshot;

/// Fixed-rate consumer: polls the coordinator once per refresh, like a
/// display callback, and forwards every finished frame to the sink.
pub struct Driver {
    coordinator: TickCoordinator,
    interval: Duration,
    sink: Option<Box<dyn Write + Send>>,
}

impl Driver {
    pub fn new(coordinator: TickCoordinator, fps: f64) -> Self {
        Self {
            coordinator,
            interval: Duration::from_secs_f64(1.0 / fps.max(1.0)),
            sink: None,
        }
    }

    /// Writes every frame as one JSON line to `sink`.
    pub fn with_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs until `ticks` frames were produced (0 means no limit) or the
    /// session asks to quit. Returns the number of frames produced.
    pub fn run(&mut self, session: &Session, ticks: u64) -> Result<u64> {
        log::info!("Starting tick loop at {:.1} refreshes/s", 1.0 / self.interval.as_secs_f64());

        let mut produced = 0u64;
        let mut next_refresh = Instant::now();
        let mut window_start = Instant::now();
        let mut window_frames = 0u32;

        while !session.quit_requested() && (ticks == 0 || produced < ticks) {
            if let Some(frame) = self.coordinator.try_tick().context("Tick failed")? {
                produced += 1;
                window_frames += 1;
                self.emit(&frame)?;
            }

            if window_start.elapsed() >= Duration::from_secs(1) {
                let rate = window_frames as f64 / window_start.elapsed().as_secs_f64();
                log::info!(
                    "{:.1} ticks/s, population {}",
                    rate,
                    self.coordinator.controls().config().population
                );
                window_frames = 0;
                window_start = Instant::now();
            }

            next_refresh += self.interval;
            let now = Instant::now();
            if next_refresh > now {
                thread::sleep(next_refresh - now);
            } else {
                next_refresh = now;
            }
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.flush().context("Failed to flush frame output")?;
        }
        log::info!("Tick loop finished after {} frames", produced);
        Ok(produced)
    }

    fn emit(&mut self, frame: &Frame) -> Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        let line = serde_json::to_string(&snapshot(frame)).context("Failed to encode frame")?;
        writeln!(sink, "{}", line).context("Failed to write frame")?;
        Ok(())
    }
}
