#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Represents a 3D point in world coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Flock simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockConfig {
    pub perception_radius: f32,
    pub avoidance_radius: f32,
    pub target_weight: f32,
    pub align_weight: f32,
    pub cohesion_weight: f32,
    pub separate_weight: f32,
    pub max_speed: f32,
    pub min_speed: f32,
    pub max_steer_force: f32,
    pub avoid_collision_weight: f32,
    pub bounds_radius: f32,
    pub collision_avoid_dst: f32,
    /// Bit mask of obstacle layers the boids steer around
    pub obstacle_mask: u32,
    /// Number of golden-spiral probe directions
    pub probe_directions: usize,
    pub avoidance_window: usize,
    pub alive_count_ttl: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            perception_radius: 2.5,
            avoidance_radius: 1.0,
            target_weight: 1.0,
            align_weight: 1.0,
            cohesion_weight: 1.0,
            separate_weight: 1.0,
            max_speed: 5.0,
            min_speed: 2.0,
            max_steer_force: 3.0,
            avoid_collision_weight: 10.0,
            bounds_radius: 0.27,
            collision_avoid_dst: 5.0,
            obstacle_mask: 1,
            probe_directions: 300,
            avoidance_window: 100,
            alive_count_ttl: 3.0,
        }
    }
}

/// Changes the point the flock seeks from `at_tick` on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetUpdate {
    pub at_tick: u64,
    /// Optional target position (None means no target/free flying)
    pub position: Option<Point3>,
}

/// Adds boids between ticks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpawnCommand {
    pub at_tick: u64,
    pub position: Point3,
    pub velocity: Point3,
    pub count: usize,
    #[serde(default = "default_jitter")]
    pub jitter_radius: f32,
}

fn default_jitter() -> f32 {
    1.0
}

/// Destroys the entities of `count` live boids, as an outside system would
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KillCommand {
    pub at_tick: u64,
    pub count: usize,
}

/// Static obstacle geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObstacleSpec {
    Sphere {
        center: Point3,
        radius: f32,
        #[serde(default = "default_layer")]
        layer: u32,
    },
    /// Solid half-space behind the plane, facing along `normal`
    Plane {
        point: Point3,
        normal: Point3,
        #[serde(default = "default_layer")]
        layer: u32,
    },
}

fn default_layer() -> u32 {
    1
}

/// A headless run: settings, starting flock, world and timed events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Scenario {
    pub settings: FlockConfig,
    pub initial_count: usize,
    pub origin: Point3,
    pub dt: f32,
    pub ticks: u64,
    pub seed: u64,
    pub obstacles: Vec<ObstacleSpec>,
    pub targets: Vec<TargetUpdate>,
    pub spawns: Vec<SpawnCommand>,
    pub kills: Vec<KillCommand>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            settings: FlockConfig::default(),
            initial_count: 50,
            origin: Point3::default(),
            dt: 1.0 / 60.0,
            ticks: 600,
            seed: 0,
            obstacles: Vec::new(),
            targets: Vec::new(),
            spawns: Vec::new(),
            kills: Vec::new(),
        }
    }
}

/// Status line reported by the simulation runner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickStatus {
    pub tick: u64,
    pub time: f32,
    pub boid_count: usize,
    pub alive_count: usize,
    pub integrated: usize,
    pub skipped: usize,
    pub avoided: usize,
    pub target_active: bool,
    pub mean_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "std")]
    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FlockConfig = serde_json::from_str(r#"{"max_speed": 8.0}"#).unwrap();
        assert_eq!(config.max_speed, 8.0);
        assert_eq!(config.min_speed, FlockConfig::default().min_speed);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_obstacle_spec_is_tagged() {
        let spec: ObstacleSpec = serde_json::from_str(
            r#"{"kind": "sphere", "center": {"x": 1.0, "y": 2.0, "z": 3.0}, "radius": 4.0}"#,
        )
        .unwrap();
        assert_eq!(
            spec,
            ObstacleSpec::Sphere {
                center: Point3::new(1.0, 2.0, 3.0),
                radius: 4.0,
                layer: 1,
            }
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_target_update_without_position() {
        let update: TargetUpdate = serde_json::from_str(r#"{"at_tick": 10, "position": null}"#).unwrap();
        assert_eq!(update.position, None);
    }
}
