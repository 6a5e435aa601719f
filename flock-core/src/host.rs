//! Capabilities the simulation borrows from its host: obstacle queries,
//! entity bindings and the target position.

use crate::settings::LayerMask;
use crate::vector::{Orientation, Vector3D};

/// Handle of the host entity a boid drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Spatial obstacle query used by obstacle avoidance.
pub trait ObstacleQuery {
    /// Sweeps a sphere of `radius` from `origin` along the unit `direction`
    /// for `max_distance`. Returns true when an obstacle on a layer in `mask`
    /// is hit.
    fn sphere_sweep(
        &self,
        origin: Vector3D,
        radius: f32,
        direction: Vector3D,
        max_distance: f32,
        mask: LayerMask,
    ) -> bool;
}

impl<F> ObstacleQuery for F
where
    F: Fn(Vector3D, f32, Vector3D, f32, LayerMask) -> bool,
{
    fn sphere_sweep(
        &self,
        origin: Vector3D,
        radius: f32,
        direction: Vector3D,
        max_distance: f32,
        mask: LayerMask,
    ) -> bool {
        self(origin, radius, direction, max_distance, mask)
    }
}

/// Open space: no sweep ever hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleQuery for NoObstacles {
    fn sphere_sweep(&self, _: Vector3D, _: f32, _: Vector3D, _: f32, _: LayerMask) -> bool {
        false
    }
}

/// Binding between boids and the renderable/physical entities they move.
pub trait EntityHost {
    /// False once the entity has been destroyed by the host.
    fn is_valid(&self, entity: EntityId) -> bool;

    fn set_transform(&mut self, entity: EntityId, position: Vector3D, orientation: Orientation);

    /// Instantiates a new entity and returns its handle.
    fn spawn(&mut self, position: Vector3D, orientation: Orientation) -> EntityId;
}

/// Supplies the point every boid seeks this tick.
pub trait TargetProvider {
    fn target_position(&self) -> Option<Vector3D>;
}

impl TargetProvider for Option<Vector3D> {
    fn target_position(&self) -> Option<Vector3D> {
        *self
    }
}
