//! Growing and compacting the flock between ticks.

use rand::Rng;

use crate::vector::Vector3D;

/// Request to add `count` boids around `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub position: Vector3D,
    pub velocity: Vector3D,
    pub count: usize,
    /// New boids are placed uniformly inside a sphere of this radius.
    pub jitter_radius: f32,
}

impl SpawnRequest {
    pub fn new(position: Vector3D, velocity: Vector3D, count: usize) -> Self {
        Self {
            position,
            velocity,
            count,
            jitter_radius: 1.0,
        }
    }

    pub fn with_jitter(mut self, jitter_radius: f32) -> Self {
        self.jitter_radius = jitter_radius;
        self
    }

    pub(crate) fn spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3D {
        if self.jitter_radius > 0.0 {
            self.position + random_in_unit_sphere(rng) * self.jitter_radius
        } else {
            self.position
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeReport {
    /// Boids dropped because their entity was destroyed.
    pub removed: usize,
    pub added: usize,
    pub total: usize,
}

/// Uniform sample from the inside of the unit sphere.
pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vector3D {
    loop {
        let candidate = Vector3D::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if candidate.sqr_magnitude() <= 1.0 {
            return candidate;
        }
    }
}

/// Alive-boid count that is only recounted once it is older than its TTL.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AliveCountCache {
    count: usize,
    checked_at: Option<f32>,
}

impl AliveCountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached count, or a fresh one from `recount` when the cache is empty or
    /// at least `ttl` seconds old at time `now`.
    pub fn get_or_refresh<F>(&mut self, now: f32, ttl: f32, recount: F) -> usize
    where
        F: FnOnce() -> usize,
    {
        let fresh = match self.checked_at {
            Some(checked_at) => now - checked_at < ttl,
            None => false,
        };

        if !fresh {
            self.count = recount();
            self.checked_at = Some(now);
        }
        self.count
    }

    /// Overwrites the count without restarting the TTL.
    pub fn set_count(&mut self, count: usize) {
        self.count = count;
    }

    pub fn cached(&self) -> Option<usize> {
        self.checked_at.map(|_| self.count)
    }
}
