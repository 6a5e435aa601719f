//! Acceleration stage: seek, alignment, cohesion and separation.

use crate::boid::Boid;
use crate::settings::FlockSettings;
use crate::vector::Vector3D;

/// Floor applied to squared distances before dividing in the separation term.
pub const MIN_SQR_DISTANCE: f32 = 1e-6;

/// Boid count at which the acceleration stage switches to rayon.
#[cfg(feature = "parallel")]
pub const PARALLEL_THRESHOLD: usize = 256;

/// Velocity-space correction toward `desired`, capped at `max_steer_force`.
///
/// A zero `desired` has no direction and contributes nothing.
pub fn steer_towards(desired: Vector3D, velocity: Vector3D, settings: &FlockSettings) -> Vector3D {
    if desired.is_zero() {
        return Vector3D::zero();
    }
    let steering = desired.normalize() * settings.max_speed - velocity;
    steering.limit(settings.max_steer_force)
}

/// Sums gathered from the flockmates of one boid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Neighborhood {
    pub flockmates: usize,
    pub heading_sum: Vector3D,
    pub center_sum: Vector3D,
    pub separation_sum: Vector3D,
}

/// Scans every other live boid within the perception radius of `boids[index]`.
pub fn gather_neighborhood(index: usize, boids: &[Boid], settings: &FlockSettings) -> Neighborhood {
    let mut hood = Neighborhood::default();
    let position = boids[index].position;
    let perception_sqr = settings.perception_radius * settings.perception_radius;
    let avoidance_sqr = settings.avoidance_radius * settings.avoidance_radius;

    for (j, other) in boids.iter().enumerate() {
        if j == index || !other.alive {
            continue;
        }

        let offset = other.position - position;
        let sqr_dst = offset.sqr_magnitude();
        if sqr_dst >= perception_sqr {
            continue;
        }

        hood.flockmates += 1;
        hood.heading_sum += other.velocity.normalize();
        hood.center_sum += other.position;

        if sqr_dst < avoidance_sqr {
            hood.separation_sum -= offset / sqr_dst.max(MIN_SQR_DISTANCE);
        }
    }

    hood
}

/// Steering acceleration for `boids[index]`. Dead boids get none.
pub fn acceleration_for(
    index: usize,
    boids: &[Boid],
    target: Option<Vector3D>,
    settings: &FlockSettings,
) -> Vector3D {
    let boid = &boids[index];
    if !boid.alive {
        return Vector3D::zero();
    }

    let mut acceleration = match target {
        Some(target) => {
            steer_towards(target - boid.position, boid.velocity, settings) * settings.target_weight
        }
        None => Vector3D::zero(),
    };

    let hood = gather_neighborhood(index, boids, settings);
    if hood.flockmates > 0 {
        let center = hood.center_sum / hood.flockmates as f32;
        let alignment = steer_towards(hood.heading_sum, boid.velocity, settings) * settings.align_weight;
        let cohesion =
            steer_towards(center - boid.position, boid.velocity, settings) * settings.cohesion_weight;
        let separation =
            steer_towards(hood.separation_sum, boid.velocity, settings) * settings.separate_weight;

        acceleration += alignment;
        acceleration += cohesion;
        acceleration += separation;
    }

    acceleration
}

/// Writes the steering acceleration of every boid into `out`.
///
/// `out` must be as long as `boids`. Each slot depends only on the shared
/// read-only snapshot, so the loop parallelizes without synchronization.
pub fn compute_accelerations(
    boids: &[Boid],
    target: Option<Vector3D>,
    settings: &FlockSettings,
    out: &mut [Vector3D],
) {
    debug_assert_eq!(boids.len(), out.len());

    #[cfg(feature = "parallel")]
    if boids.len() >= PARALLEL_THRESHOLD {
        use rayon::prelude::*;
        out.par_iter_mut().enumerate().for_each(|(i, slot)| {
            *slot = acceleration_for(i, boids, target, settings);
        });
        return;
    }

    for (i, slot) in out.iter_mut().enumerate() {
        *slot = acceleration_for(i, boids, target, settings);
    }
}
