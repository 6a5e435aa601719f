//! Obstacle avoidance over a rolling window of boids.

use core::ops::Range;

use crate::behavior::steer_towards;
use crate::boid::Boid;
use crate::host::{EntityHost, ObstacleQuery};
use crate::settings::FlockSettings;
use crate::vector::{Orientation, Vector3D};

/// Cursor over the boids that get obstacle checks this tick.
///
/// Only `size` boids are probed per tick; the window start moves forward by
/// `size` every tick and wraps at the live boid count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvoidanceWindow {
    start: usize,
}

impl AvoidanceWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Indices probed this tick. The window does not wrap past `len`.
    pub fn range(&self, len: usize, size: usize) -> Range<usize> {
        let start = self.start.min(len);
        start..start.saturating_add(size).min(len)
    }

    pub fn advance(&mut self, len: usize, size: usize) {
        self.start = if len == 0 {
            0
        } else {
            (self.start % len + size % len) % len
        };
    }

    /// Pulls the cursor back inside a shrunken population.
    pub fn clamp(&mut self, len: usize) {
        if self.start >= len {
            self.start = 0;
        }
    }
}

pub fn is_heading_for_collision<Q: ObstacleQuery + ?Sized>(
    position: Vector3D,
    forward: Vector3D,
    settings: &FlockSettings,
    obstacles: &Q,
) -> bool {
    obstacles.sphere_sweep(
        position,
        settings.bounds_radius,
        forward,
        settings.collision_avoid_dst,
        settings.obstacle_mask,
    )
}

/// First probe direction, in world space, whose sweep is clear. Falls back to
/// `forward` when every probe is blocked.
pub fn obstacle_rays<Q: ObstacleQuery + ?Sized>(
    orientation: &Orientation,
    position: Vector3D,
    forward: Vector3D,
    settings: &FlockSettings,
    obstacles: &Q,
) -> Vector3D {
    settings
        .probe_directions
        .iter()
        .map(|local| orientation.transform_direction(*local))
        .find(|dir| {
            !obstacles.sphere_sweep(
                position,
                settings.bounds_radius,
                *dir,
                settings.collision_avoid_dst,
                settings.obstacle_mask,
            )
        })
        .unwrap_or(forward)
}

/// Steering force away from obstacles for one boid, if it is heading into one.
pub fn avoidance_force<Q: ObstacleQuery + ?Sized>(
    boid: &Boid,
    settings: &FlockSettings,
    obstacles: &Q,
) -> Option<Vector3D> {
    let forward = boid.heading();
    if !is_heading_for_collision(boid.position, forward, settings, obstacles) {
        return None;
    }

    let dir = obstacle_rays(&boid.orientation, boid.position, forward, settings, obstacles);
    Some(steer_towards(dir, boid.velocity, settings) * settings.avoid_collision_weight)
}

/// Runs obstacle checks for the boids inside `window`, replacing the
/// acceleration of every boid heading for a collision, then advances the
/// window. Returns how many boids were redirected.
pub fn apply_collision_avoidance<Q, H>(
    boids: &mut [Boid],
    window: &mut AvoidanceWindow,
    settings: &FlockSettings,
    obstacles: &Q,
    host: &H,
) -> usize
where
    Q: ObstacleQuery + ?Sized,
    H: EntityHost + ?Sized,
{
    let len = boids.len();
    let mut redirected = 0;

    for i in window.range(len, settings.avoidance_window) {
        let boid = &mut boids[i];
        if !boid.alive || !host.is_valid(boid.entity) {
            continue;
        }

        if let Some(force) = avoidance_force(boid, settings, obstacles) {
            log::trace!("boid {} redirected by obstacle avoidance", i);
            boid.acceleration = force;
            redirected += 1;
        }
    }

    window.advance(len, settings.avoidance_window);
    redirected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EntityId, NoObstacles};
    use crate::probe::ProbeDirections;
    use crate::settings::LayerMask;

    /// Host where every entity below `valid_below` exists.
    struct Entities {
        valid_below: u32,
    }

    impl EntityHost for Entities {
        fn is_valid(&self, entity: EntityId) -> bool {
            entity.0 < self.valid_below
        }

        fn set_transform(&mut self, _: EntityId, _: Vector3D, _: Orientation) {}

        fn spawn(&mut self, _: Vector3D, _: Orientation) -> EntityId {
            EntityId(self.valid_below)
        }
    }

    /// A wall filling the half-space `z >= 3`.
    fn wall(origin: Vector3D, radius: f32, dir: Vector3D, max: f32, _: LayerMask) -> bool {
        if dir.z <= 0.0 {
            return false;
        }
        let travel = (3.0 - radius - origin.z) / dir.z;
        travel <= max
    }

    fn test_settings() -> FlockSettings {
        FlockSettings {
            probe_directions: ProbeDirections::from_directions([
                Vector3D::FORWARD,
                Vector3D::new(0.0, 0.5, 1.0),
                Vector3D::UP,
                Vector3D::new(0.0, 0.0, -1.0),
            ])
            .unwrap(),
            ..FlockSettings::default()
        }
    }

    fn boid_towards_wall(entity: u32) -> Boid {
        let mut boid = Boid::new(EntityId(entity), Vector3D::zero(), Vector3D::new(0.0, 0.0, 3.0));
        boid.acceleration = Vector3D::new(1.0, 1.0, 1.0);
        boid
    }

    #[test]
    fn test_window_range_and_advance() {
        let mut window = AvoidanceWindow::new();
        assert_eq!(window.range(250, 100), 0..100);
        window.advance(250, 100);
        assert_eq!(window.range(250, 100), 100..200);
        window.advance(250, 100);
        assert_eq!(window.range(250, 100), 200..250);
        window.advance(250, 100);
        assert_eq!(window.start(), 50);

        window.advance(0, 100);
        assert_eq!(window.start(), 0);
        assert_eq!(window.range(0, 100), 0..0);
    }

    #[test]
    fn test_huge_window_covers_everything_without_overflow() {
        let mut window = AvoidanceWindow::new();
        assert_eq!(window.range(4, usize::MAX), 0..4);

        window.advance(4, usize::MAX);
        assert_eq!(window.start(), 3);
        window.advance(4, usize::MAX);
        assert_eq!(window.start(), 2);
        assert_eq!(window.range(4, usize::MAX), 2..4);
    }

    #[test]
    fn test_window_clamp() {
        let mut window = AvoidanceWindow::new();
        window.advance(500, 300);
        window.clamp(100);
        assert_eq!(window.start(), 0);
    }

    #[test]
    fn test_first_clear_probe_is_selected() {
        let settings = test_settings();
        let boid = boid_towards_wall(0);
        let dir = obstacle_rays(&boid.orientation, boid.position, Vector3D::FORWARD, &settings, &wall);
        assert_eq!(dir, Vector3D::UP);
    }

    #[test]
    fn test_all_probes_blocked_falls_back_to_forward() {
        let settings = test_settings();
        let blocked = |_: Vector3D, _: f32, _: Vector3D, _: f32, _: LayerMask| true;
        let forward = Vector3D::new(0.0, 0.0, 1.0);
        let dir = obstacle_rays(&Orientation::IDENTITY, Vector3D::zero(), forward, &settings, &blocked);
        assert_eq!(dir, forward);
    }

    #[test]
    fn test_stationary_boid_probes_along_its_facing() {
        let settings = test_settings();
        let mut boid = Boid::new(EntityId(0), Vector3D::zero(), Vector3D::RIGHT);
        boid.velocity = Vector3D::zero();
        let blocked = |_: Vector3D, _: f32, dir: Vector3D, _: f32, _: LayerMask| !dir.is_zero();

        let force = avoidance_force(&boid, &settings, &blocked).unwrap();
        let expected = steer_towards(Vector3D::RIGHT, Vector3D::zero(), &settings)
            * settings.avoid_collision_weight;
        assert!((force - expected).magnitude() < 1e-5);
        assert!(!force.is_zero());
    }

    #[test]
    fn test_avoidance_overrides_acceleration() {
        let settings = test_settings();
        let mut boids = [boid_towards_wall(0)];
        let mut window = AvoidanceWindow::new();

        let redirected =
            apply_collision_avoidance(&mut boids, &mut window, &settings, &wall, &Entities { valid_below: 1 });

        assert_eq!(redirected, 1);
        let expected = steer_towards(Vector3D::UP, boids[0].velocity, &settings)
            * settings.avoid_collision_weight;
        assert_eq!(boids[0].acceleration, expected);
    }

    #[test]
    fn test_clear_path_keeps_acceleration() {
        let settings = test_settings();
        let mut boids = [boid_towards_wall(0)];
        let mut window = AvoidanceWindow::new();

        let redirected = apply_collision_avoidance(
            &mut boids,
            &mut window,
            &settings,
            &NoObstacles,
            &Entities { valid_below: 1 },
        );

        assert_eq!(redirected, 0);
        assert_eq!(boids[0].acceleration, Vector3D::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_invalid_entities_are_skipped() {
        let settings = test_settings();
        let mut boids = [boid_towards_wall(0), boid_towards_wall(5)];
        let mut window = AvoidanceWindow::new();

        let redirected =
            apply_collision_avoidance(&mut boids, &mut window, &settings, &wall, &Entities { valid_below: 1 });

        assert_eq!(redirected, 1);
        assert_eq!(boids[1].acceleration, Vector3D::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_only_window_is_checked() {
        let settings = FlockSettings {
            avoidance_window: 2,
            ..test_settings()
        };
        let mut boids = [boid_towards_wall(0), boid_towards_wall(1), boid_towards_wall(2)];
        let host = Entities { valid_below: 3 };
        let mut window = AvoidanceWindow::new();

        assert_eq!(apply_collision_avoidance(&mut boids, &mut window, &settings, &wall, &host), 2);
        assert_eq!(boids[2].acceleration, Vector3D::new(1.0, 1.0, 1.0));
        assert_eq!(window.start(), 2);

        assert_eq!(apply_collision_avoidance(&mut boids, &mut window, &settings, &wall, &host), 1);
        assert_ne!(boids[2].acceleration, Vector3D::new(1.0, 1.0, 1.0));
        assert_eq!(window.start(), 1);
    }
}
