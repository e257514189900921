use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flock_core::{Bounds, Controls};
use flock_shared::FlockSettings;
use parking_lot::Mutex;

use crate::commands::{self, Command};
use crate::engine_config;

/// User-facing settings paired with the engine controls they drive
pub struct Session {
    settings: Mutex<FlockSettings>,
    controls: Arc<Controls>,
    field_of_view: bool,
    quit: AtomicBool,
}

impl Session {
    pub fn new(settings: FlockSettings, bounds: Bounds, field_of_view: bool) -> Self {
        let settings = settings.clamped();
        Self {
            controls: Arc::new(Controls::new(engine_config(&settings, field_of_view), bounds)),
            settings: Mutex::new(settings),
            field_of_view,
            quit: AtomicBool::new(false),
        }
    }

    pub fn controls(&self) -> &Arc<Controls> {
        &self.controls
    }

    pub fn settings(&self) -> FlockSettings {
        *self.settings.lock()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::Release);
    }

    pub fn execute(&self, command: Command) {
        match command {
            Command::Set { parameter, text } => {
                let mut settings = self.settings.lock();
                let parsed = settings.apply(parameter, &text);
                if parsed.exceeds_max {
                    log::warn!(
                        "{} '{}' is above the maximum {}, using {}",
                        parameter,
                        parsed.text,
                        parameter.max(),
                        parsed.value
                    );
                } else {
                    log::info!("{} = {}", parameter, parsed.value);
                }
                self.controls
                    .set_config(engine_config(&settings, self.field_of_view));
            }
            Command::Bounds { width, height } => {
                self.controls.set_bounds(Bounds::new(width, height));
                log::info!("Draw area resized to {}x{}", width, height);
            }
            Command::Show => {
                let settings = self.settings();
                match settings.to_json() {
                    Ok(json) => log::info!("Current settings:\n{}", json),
                    Err(e) => log::warn!("Failed to render settings: {}", e),
                }
            }
            Command::Quit => {
                log::info!("Quit requested");
                self.request_quit();
            }
        }
    }

    /// Parses and executes every line from `input` until it ends or asks to quit.
    pub fn run_commands<R: BufRead>(&self, input: R) {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Failed to read control input: {}", e);
                    break;
                }
            };
            match commands::parse(&line) {
                Ok(Some(command)) => self.execute(command),
                Ok(None) => {}
                Err(e) => log::warn!("{:#}", e),
            }
            if self.quit_requested() {
                return;
            }
        }
        log::info!("Control input closed");
        self.request_quit();
    }

    /// Reads control lines from stdin on a background thread.
    pub fn spawn_stdin_reader(self: &Arc<Self>) -> std::io::Result<JoinHandle<()>> {
        let session = Arc::clone(self);
        thread::Builder::new()
            .name("flock-controls".into())
            .spawn(move || session.run_commands(std::io::stdin().lock()))
    }
}
