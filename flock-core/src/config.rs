use parking_lot::RwLock;

/// Tunable parameters as the engine sees them.
///
/// Values are expected to be clamped already by whoever produces them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockConfig {
    pub population: usize,
    pub alignment_weight: f64,
    pub cohesion_weight: f64,
    pub separation_weight: f64,
    pub alignment_radius: f64,
    pub cohesion_radius: f64,
    pub separation_radius: f64,
    pub max_force: f64,
    pub max_speed: f64,
    /// Degrees. Only consulted when `field_of_view` is on.
    pub detection_angle: f64,
    pub field_of_view: bool,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            population: 100,
            alignment_weight: 0.8,
            cohesion_weight: 0.5,
            separation_weight: 1.0,
            alignment_radius: 50.0,
            cohesion_radius: 30.0,
            separation_radius: 50.0,
            max_force: 0.1,
            max_speed: 3.0,
            detection_angle: 225.0,
            field_of_view: false,
        }
    }
}

/// Size of the draw area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Live parameters and world bounds shared between the external layer and the
/// compute worker.
#[derive(Debug)]
pub struct Controls {
    config: RwLock<FlockConfig>,
    bounds: RwLock<Bounds>,
}

impl Controls {
    pub fn new(config: FlockConfig, bounds: Bounds) -> Self {
        Self {
            config: RwLock::new(config),
            bounds: RwLock::new(bounds),
        }
    }

    pub fn config(&self) -> FlockConfig {
        *self.config.read()
    }

    pub fn set_config(&self, config: FlockConfig) {
        *self.config.write() = config;
    }

    pub fn update(&self, f: impl FnOnce(&mut FlockConfig)) {
        f(&mut self.config.write());
    }

    pub fn bounds(&self) -> Bounds {
        *self.bounds.read()
    }

    pub fn set_bounds(&self, bounds: Bounds) {
        *self.bounds.write() = bounds;
    }
}
