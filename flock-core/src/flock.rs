use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::agent::{bearing, Agent};
use crate::config::{Bounds, FlockConfig};
use crate::render::{Canvas, Frame};
use crate::Vector2D;

/// Distances are floored to this before they are used as divisors.
pub const MIN_DISTANCE: f64 = 0.001;

/// Numerator of the inverse-square push away from the walls.
pub const BOUNDARY_STRENGTH: f64 = 100.0;

const SEED_STRIDE: u64 = 1_000_003;

/// The four forces acting on one agent during a pass, before weighting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Steering {
    pub alignment: Vector2D,
    pub cohesion: Vector2D,
    pub separation: Vector2D,
    pub boundary: Vector2D,
}

impl Steering {
    /// Adds the weighted steering onto `accumulator`, clamping to the maximum
    /// speed before and after the boundary push.
    pub fn accumulate(&self, accumulator: Vector2D, config: &FlockConfig) -> Vector2D {
        let combined = (accumulator
            + self.alignment * config.alignment_weight
            + self.cohesion * config.cohesion_weight
            + self.separation * config.separation_weight)
            .limit(config.max_speed);
        (combined + self.boundary).limit(config.max_speed)
    }
}

/// What the compute pass may read about another agent
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    position: Vector2D,
    velocity: Vector2D,
}

impl Neighbor {
    fn of(agent: &Agent) -> Self {
        Self {
            position: agent.position,
            velocity: agent.velocity,
        }
    }
}

/// An ordered population of agents.
///
/// Growth appends at the tail and shrinking truncates the tail, so the
/// newest agents are always the first to go.
pub struct Flock {
    agents: Vec<Agent>,
    rng: StdRng,
    canvas: Option<Box<dyn Canvas>>,
    passes: u64,
    #[cfg(test)]
    fault_at: Option<usize>,
}

impl Default for Flock {
    fn default() -> Self {
        Self::new()
    }
}

impl Flock {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A flock whose spawns and zero-distance jitter are reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            agents: Vec::new(),
            rng,
            canvas: None,
            passes: 0,
            #[cfg(test)]
            fault_at: None,
        }
    }

    /// Gives every agent spawned from now on a marker from `canvas`.
    pub fn with_canvas(mut self, canvas: Box<dyn Canvas>) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn push(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of completed force passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn positions(&self) -> Vec<Vector2D> {
        self.agents.iter().map(|agent| agent.position).collect()
    }

    pub fn frame(&self) -> Frame {
        Frame {
            pass: self.passes,
            positions: self.positions(),
        }
    }

    /// Grows or shrinks the population to `target`. New agents spawn inside
    /// `bounds`; removal takes the most recently added agents.
    pub fn resize_to(&mut self, target: usize, bounds: Bounds) {
        let current = self.agents.len();
        match target.cmp(&current) {
            Ordering::Greater => {
                self.agents.reserve(target - current);
                for _ in current..target {
                    let agent = self.spawn(bounds);
                    self.agents.push(agent);
                }
                log::debug!("Spawned {} agents, population {}", target - current, target);
            }
            Ordering::Less => {
                self.agents.truncate(target);
                log::debug!("Removed {} agents, population {}", current - target, target);
            }
            Ordering::Equal => {}
        }
    }

    fn spawn(&mut self, bounds: Bounds) -> Agent {
        let mut agent = Agent::random(&mut self.rng, bounds.width, bounds.height);
        if let Some(canvas) = self.canvas.as_mut() {
            agent.attach_marker(canvas.spawn_marker(agent.position));
        }
        agent
    }

    /// Runs one force pass: every agent's accumulator absorbs its steering.
    ///
    /// Agents are processed in parallel against a snapshot of positions and
    /// velocities. An agent whose steering panics or comes out non-finite
    /// keeps its previous accumulator.
    pub fn compute_forces(&mut self, config: &FlockConfig, bounds: Bounds) {
        let seed: u64 = self.rng.gen();
        let neighbors: Vec<Neighbor> = self.agents.iter().map(Neighbor::of).collect();
        #[cfg(test)]
        let fault_at = self.fault_at;
        #[cfg(not(test))]
        let fault_at: Option<usize> = None;

        let skipped: usize = self
            .agents
            .par_iter_mut()
            .enumerate()
            .map(|(index, agent)| {
                let current = agent.accumulator;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    if fault_at == Some(index) {
                        panic!("injected steering fault for agent {}", index);
                    }
                    steering(index, &neighbors, config, bounds, seed).accumulate(current, config)
                }));
                match outcome {
                    Ok(next) if next.is_finite() => {
                        agent.accumulator = next;
                        0
                    }
                    Ok(next) => {
                        log::warn!("Agent {} produced non-finite steering {:?}, skipped", index, next);
                        1
                    }
                    Err(_) => {
                        log::error!("Steering for agent {} panicked, skipped", index);
                        1
                    }
                }
            })
            .sum();

        self.passes += 1;
        log::trace!(
            "Force pass {} over {} agents ({} skipped)",
            self.passes,
            neighbors.len(),
            skipped
        );
    }

    /// Steering for agent `index` against the current positions, for
    /// inspection. Zero-distance jitter uses a fixed seed of 0, so for
    /// coincident agents the separation differs from what a real pass, which
    /// draws its seed from the flock's RNG, would compute.
    pub fn steering_for(&self, index: usize, config: &FlockConfig, bounds: Bounds) -> Option<Steering> {
        if index >= self.agents.len() {
            return None;
        }
        let neighbors: Vec<Neighbor> = self.agents.iter().map(Neighbor::of).collect();
        Some(steering(index, &neighbors, config, bounds, 0))
    }

    pub fn integrate(&mut self, bounds: Bounds) {
        for agent in self.agents.iter_mut() {
            agent.integrate(bounds.width, bounds.height);
        }
    }

    /// The apply half of a tick: resize to the configured population, then
    /// integrate every agent.
    pub fn apply(&mut self, config: &FlockConfig, bounds: Bounds) -> Frame {
        self.resize_to(config.population, bounds);
        self.integrate(bounds);
        self.frame()
    }

    /// One whole tick on the calling thread.
    pub fn step(&mut self, config: &FlockConfig, bounds: Bounds) -> Frame {
        self.compute_forces(config, bounds);
        self.apply(config, bounds)
    }
}

fn steering(index: usize, neighbors: &[Neighbor], config: &FlockConfig, bounds: Bounds, seed: u64) -> Steering {
    let cur = neighbors[index];

    let mut alignment = Vector2D::zero();
    let mut cohesion = Vector2D::zero();
    let mut separation = Vector2D::zero();
    let mut alignment_count = 0usize;
    let mut cohesion_count = 0usize;
    let mut separation_count = 0usize;
    let mut jitter: Option<StdRng> = None;

    for (other_index, other) in neighbors.iter().enumerate() {
        if other_index == index {
            continue;
        }
        if config.field_of_view
            && bearing(cur.velocity, cur.position, other.position) > config.detection_angle / 2.0
        {
            continue;
        }

        let dist = cur.position.distance(&other.position).max(MIN_DISTANCE);

        if dist < config.alignment_radius {
            alignment_count += 1;
            alignment += other.velocity;
        }
        if dist < config.cohesion_radius {
            cohesion_count += 1;
            cohesion += other.position;
        }
        if dist < config.separation_radius {
            separation_count += 1;
            let rng = jitter
                .get_or_insert_with(|| StdRng::seed_from_u64(seed.wrapping_add(index as u64 * SEED_STRIDE)));
            separation += (cur.position - other.position).ensure_non_zero(rng) / (dist * dist);
        }
    }

    if alignment_count > 0 {
        alignment = steer(alignment / alignment_count as f64, cur.velocity, config);
    }
    if cohesion_count > 0 {
        cohesion = steer(cohesion / cohesion_count as f64 - cur.position, cur.velocity, config);
    }
    if separation_count > 0 {
        separation = steer(separation / separation_count as f64, cur.velocity, config);
    }

    Steering {
        alignment,
        cohesion,
        separation,
        boundary: boundary_force(cur.position, bounds),
    }
}

fn steer(desired: Vector2D, velocity: Vector2D, config: &FlockConfig) -> Vector2D {
    (desired.with_magnitude(config.max_speed) - velocity).limit(config.max_force)
}

/// Inverse-square push from whichever wall is nearer on each axis.
pub fn boundary_force(position: Vector2D, bounds: Bounds) -> Vector2D {
    Vector2D::new(
        wall_push(position.x, bounds.width),
        wall_push(position.y, bounds.height),
    )
}

fn wall_push(value: f64, limit: f64) -> f64 {
    if value < limit / 2.0 {
        BOUNDARY_STRENGTH / (value * value)
    } else {
        let gap = limit - value;
        -BOUNDARY_STRENGTH / (gap * gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn world() -> Bounds {
        Bounds::new(1000.0, 1000.0)
    }

    fn close(a: Vector2D, b: Vector2D) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    fn pair_config() -> FlockConfig {
        FlockConfig {
            population: 2,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            separation_weight: 1.0,
            alignment_radius: 20.0,
            cohesion_radius: 20.0,
            separation_radius: 20.0,
            max_force: 0.1,
            max_speed: 3.0,
            ..FlockConfig::default()
        }
    }

    fn pair() -> Flock {
        let mut flock = Flock::seeded(1);
        flock.push(Agent::new(Vector2D::new(100.0, 100.0), Vector2D::new(1.0, 0.0)));
        flock.push(Agent::new(Vector2D::new(110.0, 100.0), Vector2D::new(-1.0, 0.0)));
        flock
    }

    #[test]
    fn test_pair_steering_components() {
        let flock = pair();
        let steering = flock.steering_for(0, &pair_config(), world()).unwrap();

        // Heading match opposes A's rightward motion, the centroid pulls
        // right, the repulsion pushes left.
        assert!(close(steering.alignment, Vector2D::new(-0.1, 0.0)));
        assert!(close(steering.cohesion, Vector2D::new(0.1, 0.0)));
        assert!(close(steering.separation, Vector2D::new(-0.1, 0.0)));
        assert!(close(steering.boundary, Vector2D::new(0.01, 0.01)));
    }

    #[test]
    fn test_pair_tick() {
        let mut flock = pair();
        let config = pair_config();
        flock.step(&config, world());

        let a = &flock.agents()[0];
        assert!(close(a.accumulator, Vector2D::new(0.91, 0.01)));
        assert!(close(a.velocity, Vector2D::new(0.91, 0.01)));
        assert!(close(a.position, Vector2D::new(100.91, 100.01)));

        let b = &flock.agents()[1];
        let push = 100.0 / (110.0 * 110.0);
        assert!(close(b.accumulator, Vector2D::new(-0.9 + push, 0.01)));
        assert!(close(b.position, Vector2D::new(110.0 - 0.9 + push, 100.01)));
    }

    #[test]
    fn test_lone_agent_feels_only_walls() {
        let config = FlockConfig {
            max_speed: 10.0,
            ..FlockConfig::default()
        };
        let mut flock = Flock::seeded(2);
        flock.push(Agent::new(Vector2D::new(5.0, 500.0), Vector2D::zero()));

        let steering = flock.steering_for(0, &config, world()).unwrap();
        assert_eq!(steering.alignment, Vector2D::zero());
        assert_eq!(steering.cohesion, Vector2D::zero());
        assert_eq!(steering.separation, Vector2D::zero());
        assert!((steering.boundary.x - 4.0).abs() < EPS);
        assert!((steering.boundary.y + 100.0 / (500.0 * 500.0)).abs() < EPS);

        flock.agents_mut()[0].position = Vector2D::new(995.0, 500.0);
        let steering = flock.steering_for(0, &config, world()).unwrap();
        assert!((steering.boundary.x + 4.0).abs() < EPS);
    }

    #[test]
    fn test_out_of_range_neighbors_contribute_nothing() {
        let mut flock = Flock::seeded(3);
        flock.push(Agent::new(Vector2D::new(400.0, 400.0), Vector2D::new(1.0, 1.0)));
        flock.push(Agent::new(Vector2D::new(500.0, 400.0), Vector2D::new(-2.0, 0.5)));

        let steering = flock.steering_for(0, &pair_config(), world()).unwrap();
        assert_eq!(steering.alignment, Vector2D::zero());
        assert_eq!(steering.cohesion, Vector2D::zero());
        assert_eq!(steering.separation, Vector2D::zero());
    }

    #[test]
    fn test_coincident_agents_separate() {
        let mut flock = Flock::seeded(4);
        flock.push(Agent::new(Vector2D::new(300.0, 300.0), Vector2D::zero()));
        flock.push(Agent::new(Vector2D::new(300.0, 300.0), Vector2D::zero()));

        let config = pair_config();
        let steering = flock.steering_for(0, &config, world()).unwrap();
        assert!(steering.separation.is_finite());
        assert!(steering.separation.length() > 0.0);
        assert!((steering.separation.length() - config.max_force).abs() < 1e-9);

        flock.compute_forces(&config, world());
        assert!(flock.agents().iter().all(|agent| agent.accumulator.is_finite()));
    }

    #[test]
    fn test_accumulator_persists_between_passes() {
        let mut flock = Flock::seeded(5);
        flock.push(Agent::new(Vector2D::new(500.0, 500.0), Vector2D::new(2.0, 0.0)));
        let config = FlockConfig::default();

        flock.compute_forces(&config, world());
        let after_one = flock.agents()[0].accumulator;
        // A lone agent in the exact centre only sees the far-side wall push.
        let push = -100.0 / (500.0 * 500.0);
        assert!(close(after_one, Vector2D::new(2.0 + push, push)));

        flock.compute_forces(&config, world());
        assert!(close(flock.agents()[0].accumulator, Vector2D::new(2.0 + 2.0 * push, 2.0 * push)));
    }

    #[test]
    fn test_accumulator_is_bounded() {
        let mut flock = Flock::seeded(6);
        let bounds = Bounds::new(200.0, 150.0);
        flock.resize_to(80, bounds);
        let config = FlockConfig {
            max_speed: 2.0,
            separation_weight: 1.0,
            ..FlockConfig::default()
        };

        for _ in 0..20 {
            flock.compute_forces(&config, bounds);
            for agent in flock.agents() {
                assert!(agent.accumulator.length() <= config.max_speed + 1e-9);
            }
            flock.apply(&config, bounds);
        }
    }

    #[test]
    fn test_agent_on_wall_keeps_previous_accumulator() {
        let mut flock = Flock::seeded(7);
        flock.push(Agent::new(Vector2D::new(0.0, 500.0), Vector2D::new(1.0, 0.5)));
        flock.push(Agent::new(Vector2D::new(500.0, 500.0), Vector2D::new(1.0, 0.0)));

        flock.compute_forces(&FlockConfig::default(), world());

        assert_eq!(flock.agents()[0].accumulator, Vector2D::new(1.0, 0.5));
        assert!(flock.agents()[1].accumulator != Vector2D::new(1.0, 0.0));
    }

    #[test]
    fn test_panicking_agent_is_isolated() {
        let config = pair_config();
        let mut faulty = pair();
        faulty.agents_mut()[0].accumulator = Vector2D::new(0.5, -0.5);
        faulty.fault_at = Some(0);
        faulty.compute_forces(&config, world());

        let mut healthy = pair();
        healthy.agents_mut()[0].accumulator = Vector2D::new(0.5, -0.5);
        healthy.compute_forces(&config, world());

        assert_eq!(faulty.agents()[0].accumulator, Vector2D::new(0.5, -0.5));
        assert_eq!(faulty.agents()[1].accumulator, healthy.agents()[1].accumulator);
        assert!(faulty.agents()[1].accumulator != Vector2D::new(-1.0, 0.0));
        assert_eq!(faulty.passes(), 1);
    }

    #[test]
    fn test_field_of_view_ignores_agents_behind() {
        let mut flock = Flock::seeded(8);
        flock.push(Agent::new(Vector2D::new(500.0, 500.0), Vector2D::new(1.0, 0.0)));
        flock.push(Agent::new(Vector2D::new(490.0, 500.0), Vector2D::new(0.0, 1.0)));

        let mut config = pair_config();
        config.detection_angle = 90.0;

        let blind = flock.steering_for(0, &config, world()).unwrap();
        assert!(blind.alignment != Vector2D::zero());

        config.field_of_view = true;
        let sighted = flock.steering_for(0, &config, world()).unwrap();
        assert_eq!(sighted.alignment, Vector2D::zero());
        assert_eq!(sighted.cohesion, Vector2D::zero());
        assert_eq!(sighted.separation, Vector2D::zero());
    }

    #[test]
    fn test_resize_grows_at_tail() {
        let mut flock = Flock::seeded(9);
        let bounds = Bounds::new(640.0, 480.0);
        flock.resize_to(10, bounds);
        let before = flock.positions();

        flock.resize_to(15, bounds);
        assert_eq!(flock.len(), 15);
        assert_eq!(&flock.positions()[..10], &before[..]);
        for agent in &flock.agents()[10..] {
            assert!((0.0..640.0).contains(&agent.position.x));
            assert!((0.0..480.0).contains(&agent.position.y));
        }
    }

    #[test]
    fn test_resize_shrinks_from_tail() {
        let mut flock = Flock::seeded(10);
        let bounds = Bounds::new(640.0, 480.0);
        flock.resize_to(12, bounds);
        let before = flock.positions();

        flock.resize_to(7, bounds);
        assert_eq!(flock.len(), 7);
        assert_eq!(flock.positions(), before[..7].to_vec());

        flock.resize_to(7, bounds);
        assert_eq!(flock.len(), 7);

        flock.resize_to(0, bounds);
        assert!(flock.is_empty());
    }
}
