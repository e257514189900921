use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod input;

pub use input::{filter_decimal, filter_integer, parse_decimal, parse_integer, ParsedInput};

/// Represents a 2D position in draw-area coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Positions of every agent after one tick, for renderers outside the process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub pass: u64,
    pub positions: Vec<Position>,
}

/// Flock simulation settings as exposed to users
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockSettings {
    #[serde(deserialize_with = "whole_number")]
    pub population: u32,
    pub alignment_weight: f64,
    pub cohesion_weight: f64,
    pub separation_weight: f64,
    #[serde(deserialize_with = "whole_number")]
    pub alignment_radius: u32,
    #[serde(deserialize_with = "whole_number")]
    pub cohesion_radius: u32,
    #[serde(deserialize_with = "whole_number")]
    pub separation_radius: u32,
    pub max_force: f64,
    pub max_speed: f64,
    pub detection_angle: f64,
}

/// Accepts any JSON number for a count or radius. Negatives become 0,
/// fractions are truncated and huge values saturate; `clamped` then applies
/// the parameter's own maximum.
fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.max(0.0).min(u32::MAX as f64) as u32)
}

impl Default for FlockSettings {
    fn default() -> Self {
        Self {
            population: 100,
            alignment_weight: 0.8,
            cohesion_weight: 0.5,
            separation_weight: 1.0,
            alignment_radius: 50,
            cohesion_radius: 30,
            separation_radius: 50,
            max_force: 0.1,
            max_speed: 3.0,
            detection_angle: 225.0,
        }
    }
}

impl FlockSettings {
    /// Parses a settings document; missing fields keep their defaults.
    /// The result is clamped into each parameter's domain.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::clamped)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn clamped(self) -> Self {
        let mut clamped = self;
        for parameter in Parameter::ALL {
            clamped.set(parameter, self.get(parameter));
        }
        clamped
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Population => self.population as f64,
            Parameter::AlignmentWeight => self.alignment_weight,
            Parameter::CohesionWeight => self.cohesion_weight,
            Parameter::SeparationWeight => self.separation_weight,
            Parameter::AlignmentRadius => self.alignment_radius as f64,
            Parameter::CohesionRadius => self.cohesion_radius as f64,
            Parameter::SeparationRadius => self.separation_radius as f64,
            Parameter::MaxForce => self.max_force,
            Parameter::MaxSpeed => self.max_speed,
            Parameter::DetectionAngle => self.detection_angle,
        }
    }

    /// Stores `value` clamped into the parameter's domain.
    pub fn set(&mut self, parameter: Parameter, value: f64) {
        // NaN clamps to zero.
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, parameter.max())
        };
        match parameter {
            Parameter::Population => self.population = value as u32,
            Parameter::AlignmentWeight => self.alignment_weight = value,
            Parameter::CohesionWeight => self.cohesion_weight = value,
            Parameter::SeparationWeight => self.separation_weight = value,
            Parameter::AlignmentRadius => self.alignment_radius = value as u32,
            Parameter::CohesionRadius => self.cohesion_radius = value as u32,
            Parameter::SeparationRadius => self.separation_radius = value as u32,
            Parameter::MaxForce => self.max_force = value,
            Parameter::MaxSpeed => self.max_speed = value,
            Parameter::DetectionAngle => self.detection_angle = value,
        }
    }

    /// Applies raw text typed for `parameter`, the way a text field would.
    pub fn apply(&mut self, parameter: Parameter, raw: &str) -> ParsedInput {
        let parsed = parameter.parse(raw);
        self.set(parameter, parsed.value);
        parsed
    }
}

/// Whether a parameter takes whole numbers or decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Integer,
    Decimal,
}

/// A live-tunable simulation parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Population,
    AlignmentWeight,
    CohesionWeight,
    SeparationWeight,
    AlignmentRadius,
    CohesionRadius,
    SeparationRadius,
    MaxForce,
    MaxSpeed,
    DetectionAngle,
}

impl Parameter {
    pub const ALL: [Parameter; 10] = [
        Parameter::Population,
        Parameter::AlignmentWeight,
        Parameter::CohesionWeight,
        Parameter::SeparationWeight,
        Parameter::AlignmentRadius,
        Parameter::CohesionRadius,
        Parameter::SeparationRadius,
        Parameter::MaxForce,
        Parameter::MaxSpeed,
        Parameter::DetectionAngle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Population => "population",
            Parameter::AlignmentWeight => "alignment_weight",
            Parameter::CohesionWeight => "cohesion_weight",
            Parameter::SeparationWeight => "separation_weight",
            Parameter::AlignmentRadius => "alignment_radius",
            Parameter::CohesionRadius => "cohesion_radius",
            Parameter::SeparationRadius => "separation_radius",
            Parameter::MaxForce => "max_force",
            Parameter::MaxSpeed => "max_speed",
            Parameter::DetectionAngle => "detection_angle",
        }
    }

    /// Upper end of the domain; every parameter starts at zero.
    pub fn max(&self) -> f64 {
        match self {
            Parameter::Population => 10_000.0,
            Parameter::AlignmentWeight | Parameter::CohesionWeight | Parameter::SeparationWeight => 1.0,
            Parameter::AlignmentRadius | Parameter::CohesionRadius | Parameter::SeparationRadius => 1000.0,
            Parameter::MaxForce => 1.0,
            Parameter::MaxSpeed => 10.0,
            Parameter::DetectionAngle => 360.0,
        }
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Parameter::Population
            | Parameter::AlignmentRadius
            | Parameter::CohesionRadius
            | Parameter::SeparationRadius => ParameterKind::Integer,
            _ => ParameterKind::Decimal,
        }
    }

    /// How many characters of typed text are kept for display.
    pub fn width(&self) -> usize {
        match self {
            Parameter::AlignmentRadius | Parameter::CohesionRadius | Parameter::SeparationRadius => 4,
            _ => 5,
        }
    }

    pub fn parse(&self, raw: &str) -> ParsedInput {
        match self.kind() {
            ParameterKind::Integer => parse_integer(raw, self.max() as u64, self.width()),
            ParameterKind::Decimal => parse_decimal(raw, self.max(), self.width()),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned for an unknown parameter name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown parameter '{0}'")]
pub struct UnknownParameter(pub String);

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Parameter::ALL
            .into_iter()
            .find(|parameter| parameter.name() == wanted)
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}
