pub mod commands;
pub mod driver;
pub mod session;

use flock_core::{FlockConfig, Frame};
use flock_shared::{FlockSettings, FrameSnapshot, Position};

pub use commands::Command;
pub use driver::Driver;
pub use session::Session;

/// Engine view of user settings. `field_of_view` turns the detection angle on.
pub fn engine_config(settings: &FlockSettings, field_of_view: bool) -> FlockConfig {
    FlockConfig {
        population: settings.population as usize,
        alignment_weight: settings.alignment_weight,
        cohesion_weight: settings.cohesion_weight,
        separation_weight: settings.separation_weight,
        alignment_radius: settings.alignment_radius as f64,
        cohesion_radius: settings.cohesion_radius as f64,
        separation_radius: settings.separation_radius as f64,
        max_force: settings.max_force,
        max_speed: settings.max_speed,
        detection_angle: settings.detection_angle,
        field_of_view,
    }
}

pub fn snapshot(frame: &Frame) -> FrameSnapshot {
    FrameSnapshot {
        pass: frame.pass,
        positions: frame
            .positions
            .iter()
            .map(|p| Position::new(p.x, p.y))
            .collect(),
    }
}
