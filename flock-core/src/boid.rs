use crate::host::EntityId;
use crate::vector::{Orientation, Vector3D};

/// A single boid entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    pub position: Vector3D,
    pub velocity: Vector3D,
    /// Steering accumulated for the current tick, cleared by integration.
    pub acceleration: Vector3D,
    pub orientation: Orientation,
    pub entity: EntityId,
    /// Cleared once the host reports the entity destroyed.
    pub alive: bool,
}

impl Boid {
    pub fn new(entity: EntityId, position: Vector3D, velocity: Vector3D) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector3D::zero(),
            orientation: Orientation::look_rotation(velocity),
            entity,
            alive: true,
        }
    }

    /// Direction of travel, or the current facing when the boid is stationary.
    pub fn heading(&self) -> Vector3D {
        let dir = self.velocity.normalize();
        if dir.is_zero() {
            self.orientation.forward
        } else {
            dir
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }
}
