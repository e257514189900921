//! Flocking simulation engine: agents steered by alignment, cohesion and
//! separation plus a wall push, with a parallel force pass handed off to a
//! single-threaded apply phase.

pub mod agent;
pub mod config;
pub mod error;
pub mod flock;
pub mod render;
pub mod tick;
pub mod vector;

pub use agent::Agent;
pub use config::{Bounds, Controls, FlockConfig};
pub use error::{Result, TickError};
pub use flock::{boundary_force, Flock, Steering, BOUNDARY_STRENGTH, MIN_DISTANCE};
pub use render::{Canvas, Frame, Marker};
pub use tick::TickCoordinator;
pub use vector::Vector2D;
