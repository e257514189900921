use core::fmt;

use rand::Rng;

use crate::render::Marker;
use crate::Vector2D;

/// A single boid.
///
/// `accumulator` is the steering register the force pass adds onto. It is never
/// reset between ticks and is clamped to the maximum speed, so it carries the
/// agent's inertia; integration moves the agent by it and copies it into
/// `velocity`.
pub struct Agent {
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub accumulator: Vector2D,
    /// Drawn once at spawn; not consumed by the tick.
    pub speed: f64,
    marker: Option<Box<dyn Marker>>,
}

impl Agent {
    pub fn new(position: Vector2D, velocity: Vector2D) -> Self {
        Self {
            position,
            velocity,
            accumulator: velocity,
            speed: velocity.length(),
            marker: None,
        }
    }

    /// Spawns an agent at a uniform point of the `width` x `height` area with a
    /// random heading and a speed in `[1, 4)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: f64, height: f64) -> Self {
        let position = Vector2D::new(
            rng.gen::<f64>() * width.max(0.0),
            rng.gen::<f64>() * height.max(0.0),
        );
        let speed = rng.gen_range(1.0..4.0);
        let velocity = Vector2D::new(rng.gen::<f64>() * 5.0 - 2.5, rng.gen::<f64>() * 5.0 - 2.5)
            .with_magnitude(speed);
        Self {
            speed,
            ..Self::new(position, velocity)
        }
    }

    pub fn attach_marker(&mut self, marker: Box<dyn Marker>) {
        self.marker = Some(marker);
    }

    pub fn has_marker(&self) -> bool {
        self.marker.is_some()
    }

    pub fn distance_to(&self, other: &Agent) -> f64 {
        self.position.distance(&other.position)
    }

    /// Angle in degrees between this agent's heading and the direction to `other`.
    pub fn bearing_to(&self, other: &Agent) -> f64 {
        bearing(self.velocity, self.position, other.position)
    }

    /// Moves the agent by its accumulator and keeps it inside
    /// `[1, limit - 1]` on both axes.
    pub fn integrate(&mut self, x_limit: f64, y_limit: f64) {
        self.position += self.accumulator;
        self.velocity = self.accumulator;
        self.position.x = clamp_axis(self.position.x, x_limit);
        self.position.y = clamp_axis(self.position.y, y_limit);

        if let Some(marker) = self.marker.as_mut() {
            marker.place(self.position);
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("accumulator", &self.accumulator)
            .field("speed", &self.speed)
            .field("has_marker", &self.has_marker())
            .finish()
    }
}

pub(crate) fn bearing(heading: Vector2D, from: Vector2D, to: Vector2D) -> f64 {
    let direction = (to - from).normalized();
    let cos = heading.normalized().dot(&direction).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

// Worlds narrower than 2 pin to the low edge.
fn clamp_axis(value: f64, limit: f64) -> f64 {
    value.min(limit - 1.0).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<Vector2D>>>);

    impl Marker for Recorder {
        fn place(&mut self, position: Vector2D) {
            self.0.lock().unwrap().push(position);
        }
    }

    #[test]
    fn test_agent_creation() {
        let agent = Agent::new(Vector2D::new(10.0, 20.0), Vector2D::new(3.0, 4.0));
        assert_eq!(agent.accumulator, Vector2D::new(3.0, 4.0));
        assert_eq!(agent.speed, 5.0);
        assert!(!agent.has_marker());
    }

    #[test]
    fn test_random_agent() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let agent = Agent::random(&mut rng, 800.0, 600.0);
            assert!((0.0..800.0).contains(&agent.position.x));
            assert!((0.0..600.0).contains(&agent.position.y));
            assert!((1.0..4.0).contains(&agent.speed));
            assert!((agent.velocity.length() - agent.speed).abs() < 1e-9);
            assert_eq!(agent.accumulator, agent.velocity);
        }
    }

    #[test]
    fn test_distance_to() {
        let a = Agent::new(Vector2D::new(0.0, 0.0), Vector2D::zero());
        let b = Agent::new(Vector2D::new(3.0, 4.0), Vector2D::zero());
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_integrate_moves_by_accumulator() {
        let mut agent = Agent::new(Vector2D::new(50.0, 50.0), Vector2D::new(1.0, 0.0));
        agent.accumulator = Vector2D::new(2.0, -1.0);
        agent.integrate(100.0, 100.0);

        assert_eq!(agent.position, Vector2D::new(52.0, 49.0));
        assert_eq!(agent.velocity, Vector2D::new(2.0, -1.0));
    }

    #[test]
    fn test_integrate_clamps_to_world() {
        let mut agent = Agent::new(Vector2D::new(0.5, 99.5), Vector2D::zero());
        agent.accumulator = Vector2D::new(-3.0, 3.0);
        agent.integrate(100.0, 100.0);
        assert_eq!(agent.position, Vector2D::new(1.0, 99.0));

        let mut tiny = Agent::new(Vector2D::new(0.5, 0.5), Vector2D::zero());
        tiny.integrate(1.0, 1.0);
        assert_eq!(tiny.position, Vector2D::new(1.0, 1.0));
    }

    #[test]
    fn test_integrate_forwards_to_marker() {
        let placed = Arc::new(Mutex::new(Vec::new()));
        let mut agent = Agent::new(Vector2D::new(10.0, 10.0), Vector2D::new(1.0, 1.0));
        agent.attach_marker(Box::new(Recorder(placed.clone())));
        agent.integrate(100.0, 100.0);

        assert_eq!(*placed.lock().unwrap(), vec![Vector2D::new(11.0, 11.0)]);
    }

    #[test]
    fn test_bearing_to() {
        let a = Agent::new(Vector2D::new(0.0, 0.0), Vector2D::new(1.0, 0.0));
        let ahead = Agent::new(Vector2D::new(5.0, 0.0), Vector2D::zero());
        let side = Agent::new(Vector2D::new(0.0, 5.0), Vector2D::zero());
        let behind = Agent::new(Vector2D::new(-5.0, 0.0), Vector2D::zero());

        assert!(a.bearing_to(&ahead).abs() < 1e-9);
        assert!((a.bearing_to(&side) - 90.0).abs() < 1e-9);
        assert!((a.bearing_to(&behind) - 180.0).abs() < 1e-9);
    }
}
