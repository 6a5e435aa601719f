#![cfg_attr(not(feature = "std"), no_std)]

//! Boid flocking with reactive obstacle avoidance.
//!
//! A tick runs three stages in order: [`behavior`] computes steering
//! accelerations, [`avoidance`] overrides them for boids about to hit an
//! obstacle, and [`integrate`] moves the boids. With the `std` feature,
//! [`Flock`] owns the boids, sequences the stages and manages population
//! changes between ticks.

pub mod avoidance;
pub mod behavior;
pub mod boid;
pub mod host;
pub mod integrate;
pub mod probe;
pub mod settings;
pub mod vector;

#[cfg(feature = "std")]
pub mod flock;
#[cfg(feature = "std")]
pub mod population;
#[cfg(feature = "std")]
mod worker;

pub use avoidance::{apply_collision_avoidance, AvoidanceWindow};
pub use behavior::{compute_accelerations, steer_towards};
pub use boid::Boid;
pub use host::{EntityHost, EntityId, NoObstacles, ObstacleQuery, TargetProvider};
pub use integrate::{integrate, integrate_boid, IntegrationReport};
pub use probe::{ProbeDirections, MAX_PROBE_DIRECTIONS};
pub use settings::{FlockSettings, LayerMask, SettingsError};
pub use vector::{Orientation, Vector3D};

#[cfg(feature = "std")]
pub use flock::{Flock, PendingTick, TickReport};
#[cfg(feature = "std")]
pub use population::{AliveCountCache, ResizeReport, SpawnRequest};
