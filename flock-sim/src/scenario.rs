use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use flock_core::{FlockSettings, LayerMask, ProbeDirections, SpawnRequest, Vector3D, MAX_PROBE_DIRECTIONS};
use flock_shared::{FlockConfig, ObstacleSpec, Point3, Scenario, SpawnCommand};

use crate::world::Obstacle;

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    parse_scenario(&text).with_context(|| format!("Invalid scenario in {}", path.display()))
}

pub fn parse_scenario(text: &str) -> Result<Scenario> {
    let scenario: Scenario = serde_json::from_str(text).context("Failed to parse scenario JSON")?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

pub fn validate_scenario(scenario: &Scenario) -> Result<()> {
    if !(scenario.dt.is_finite() && scenario.dt > 0.0) {
        bail!("dt must be a positive number of seconds, got {}", scenario.dt);
    }
    for spawn in &scenario.spawns {
        if spawn.jitter_radius < 0.0 {
            bail!("spawn at tick {} has a negative jitter radius", spawn.at_tick);
        }
    }
    for obstacle in &scenario.obstacles {
        match obstacle {
            ObstacleSpec::Sphere { radius, .. } if *radius <= 0.0 => {
                bail!("sphere obstacle radius must be positive, got {}", radius)
            }
            ObstacleSpec::Plane { normal, .. } if to_vector(*normal).is_zero() => {
                bail!("plane obstacle normal must not be zero")
            }
            _ => {}
        }
    }
    Ok(())
}

pub fn to_vector(point: Point3) -> Vector3D {
    Vector3D::new(point.x, point.y, point.z)
}

pub fn settings_from_config(config: &FlockConfig) -> Result<FlockSettings> {
    if config.probe_directions > MAX_PROBE_DIRECTIONS {
        log::warn!(
            "{} probe directions requested, using the maximum of {}",
            config.probe_directions,
            MAX_PROBE_DIRECTIONS
        );
    }

    let settings = FlockSettings {
        perception_radius: config.perception_radius,
        avoidance_radius: config.avoidance_radius,
        target_weight: config.target_weight,
        align_weight: config.align_weight,
        cohesion_weight: config.cohesion_weight,
        separate_weight: config.separate_weight,
        max_speed: config.max_speed,
        min_speed: config.min_speed,
        max_steer_force: config.max_steer_force,
        avoid_collision_weight: config.avoid_collision_weight,
        bounds_radius: config.bounds_radius,
        collision_avoid_dst: config.collision_avoid_dst,
        obstacle_mask: LayerMask(config.obstacle_mask),
        probe_directions: ProbeDirections::golden_spiral(config.probe_directions),
        avoidance_window: config.avoidance_window,
        alive_count_ttl: config.alive_count_ttl,
    };
    settings.validate().context("Invalid flock settings")?;
    Ok(settings)
}

pub fn obstacle_from_spec(spec: &ObstacleSpec) -> Obstacle {
    match *spec {
        ObstacleSpec::Sphere { center, radius, layer } => Obstacle::Sphere {
            center: to_vector(center),
            radius,
            layer: LayerMask(layer),
        },
        ObstacleSpec::Plane { point, normal, layer } => Obstacle::HalfSpace {
            point: to_vector(point),
            normal: to_vector(normal).normalize(),
            layer: LayerMask(layer),
        },
    }
}

pub fn spawn_request(command: &SpawnCommand) -> SpawnRequest {
    SpawnRequest::new(to_vector(command.position), to_vector(command.velocity), command.count)
        .with_jitter(command.jitter_radius)
}
