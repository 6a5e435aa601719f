//! Integration stage: acceleration into velocity, velocity into position.

use crate::boid::Boid;
use crate::host::EntityHost;
use crate::settings::FlockSettings;
use crate::vector::{Orientation, Vector3D};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrationReport {
    pub integrated: usize,
    /// Boids left untouched because their entity is gone.
    pub skipped: usize,
}

/// Advances one boid by `dt` and clears its acceleration.
///
/// Speed is clamped to `[min_speed, max_speed]`. A boid whose new velocity is
/// exactly zero has no heading: it keeps its position and orientation and
/// its velocity stays zero.
pub fn integrate_boid(boid: &mut Boid, dt: f32, settings: &FlockSettings) {
    let velocity = boid.velocity + boid.acceleration * dt;
    let speed = velocity.magnitude();

    if speed > 0.0 {
        let dir = velocity / speed;
        boid.velocity = dir * speed.clamp(settings.min_speed, settings.max_speed);
        boid.position += boid.velocity * dt;
        boid.orientation = Orientation::look_rotation(dir);
    } else {
        boid.velocity = velocity;
    }

    boid.acceleration = Vector3D::zero();
}

/// Integrates every live boid and pushes the new transform to the host.
///
/// Boids whose entity the host no longer knows are marked dead and left
/// unchanged.
pub fn integrate<H: EntityHost + ?Sized>(
    boids: &mut [Boid],
    dt: f32,
    settings: &FlockSettings,
    host: &mut H,
) -> IntegrationReport {
    let mut report = IntegrationReport::default();

    for boid in boids.iter_mut() {
        if !boid.alive || !host.is_valid(boid.entity) {
            boid.alive = false;
            report.skipped += 1;
            continue;
        }

        integrate_boid(boid, dt, settings);
        host.set_transform(boid.entity, boid.position, boid.orientation);
        report.integrated += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EntityId;

    #[derive(Default)]
    struct RecordingHost {
        destroyed: Vec<EntityId>,
        transforms: Vec<(EntityId, Vector3D)>,
    }

    impl EntityHost for RecordingHost {
        fn is_valid(&self, entity: EntityId) -> bool {
            !self.destroyed.contains(&entity)
        }

        fn set_transform(&mut self, entity: EntityId, position: Vector3D, _: Orientation) {
            self.transforms.push((entity, position));
        }

        fn spawn(&mut self, _: Vector3D, _: Orientation) -> EntityId {
            EntityId(0)
        }
    }

    #[test]
    fn test_speed_is_clamped_to_range() {
        let settings = FlockSettings::default();

        let mut fast = Boid::new(EntityId(0), Vector3D::zero(), Vector3D::new(50.0, 0.0, 0.0));
        integrate_boid(&mut fast, 0.1, &settings);
        assert!((fast.speed() - settings.max_speed).abs() < 1e-5);

        let mut slow = Boid::new(EntityId(1), Vector3D::zero(), Vector3D::new(0.0, 0.1, 0.0));
        integrate_boid(&mut slow, 0.1, &settings);
        assert!((slow.speed() - settings.min_speed).abs() < 1e-5);
        assert!((slow.position.y - settings.min_speed * 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_acceleration_is_applied_and_cleared() {
        let settings = FlockSettings::default();
        let mut boid = Boid::new(EntityId(0), Vector3D::zero(), Vector3D::new(0.0, 0.0, 3.0));
        boid.acceleration = Vector3D::new(0.0, 0.0, 10.0);

        integrate_boid(&mut boid, 0.1, &settings);

        assert!((boid.velocity.z - 4.0).abs() < 1e-5);
        assert!((boid.position.z - 0.4).abs() < 1e-5);
        assert_eq!(boid.acceleration, Vector3D::zero());
    }

    #[test]
    fn test_orientation_follows_velocity() {
        let settings = FlockSettings::default();
        let mut boid = Boid::new(EntityId(0), Vector3D::zero(), Vector3D::new(0.0, 0.0, 3.0));
        boid.acceleration = Vector3D::new(60.0, 0.0, -30.0);

        integrate_boid(&mut boid, 0.1, &settings);

        assert!((boid.orientation.forward - boid.velocity.normalize()).magnitude() < 1e-5);
    }

    #[test]
    fn test_zero_velocity_holds_position() {
        let settings = FlockSettings::default();
        for dt in [0.0, 0.016, 1.0, 10.0] {
            let mut boid = Boid::new(EntityId(0), Vector3D::new(1.0, 2.0, 3.0), Vector3D::zero());
            let orientation = boid.orientation;

            integrate_boid(&mut boid, dt, &settings);

            assert_eq!(boid.position, Vector3D::new(1.0, 2.0, 3.0));
            assert_eq!(boid.velocity, Vector3D::zero());
            assert_eq!(boid.orientation, orientation);
        }
    }

    #[test]
    fn test_destroyed_entities_are_skipped() {
        let settings = FlockSettings::default();
        let mut host = RecordingHost {
            destroyed: vec![EntityId(1)],
            ..RecordingHost::default()
        };
        let mut boids = [
            Boid::new(EntityId(0), Vector3D::zero(), Vector3D::new(0.0, 0.0, 3.0)),
            Boid::new(EntityId(1), Vector3D::zero(), Vector3D::new(0.0, 0.0, 3.0)),
        ];
        boids[1].acceleration = Vector3D::new(1.0, 0.0, 0.0);
        let before = boids[1];

        let report = integrate(&mut boids, 0.5, &settings, &mut host);

        assert_eq!(report, IntegrationReport { integrated: 1, skipped: 1 });
        assert!(!boids[1].alive);
        assert_eq!(boids[1].position, before.position);
        assert_eq!(boids[1].velocity, before.velocity);
        assert_eq!(boids[1].acceleration, before.acceleration);
        assert_eq!(host.transforms, vec![(EntityId(0), boids[0].position)]);
    }
}
