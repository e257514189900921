use crate::Vector2D;

/// A drawable owned by the renderer and cached on an agent.
///
/// Dropping the marker is how the renderer learns its agent was removed.
pub trait Marker: Send {
    fn place(&mut self, position: Vector2D);
}

/// Creates a marker for every agent a flock spawns.
pub trait Canvas: Send {
    fn spawn_marker(&mut self, position: Vector2D) -> Box<dyn Marker>;
}

/// Positions of every live agent after one apply phase, in flock order
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub pass: u64,
    pub positions: Vec<Vector2D>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
