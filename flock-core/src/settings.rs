use core::fmt;

use crate::probe::{ProbeDirections, MAX_PROBE_DIRECTIONS};

/// Bit mask selecting which obstacle layers a sphere sweep is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);
    /// Static level geometry.
    pub const ENVIRONMENT: Self = Self(1 << 0);
    pub const ENEMY_HURT_BOX: Self = Self(1 << 1);
    pub const ENEMY_PROJECTILE: Self = Self(1 << 2);

    pub fn contains_any(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl core::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Configuration for the flock simulation, shared read-only by every stage
/// of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FlockSettings {
    /// Distance within which another boid counts as a flockmate.
    pub perception_radius: f32,
    /// Distance within which a flockmate pushes this boid away.
    pub avoidance_radius: f32,
    pub target_weight: f32,
    pub align_weight: f32,
    pub cohesion_weight: f32,
    pub separate_weight: f32,
    pub max_speed: f32,
    pub min_speed: f32,
    pub max_steer_force: f32,
    pub avoid_collision_weight: f32,
    /// Radius of the sphere swept forward when probing for obstacles.
    pub bounds_radius: f32,
    /// How far ahead obstacles are probed.
    pub collision_avoid_dst: f32,
    pub obstacle_mask: LayerMask,
    pub probe_directions: ProbeDirections,
    /// Number of boids checked for obstacles per tick.
    pub avoidance_window: usize,
    /// Seconds a cached alive count stays fresh.
    pub alive_count_ttl: f32,
}

impl Default for FlockSettings {
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
            obstacle_mask: LayerMask::ENVIRONMENT,
            probe_directions: ProbeDirections::golden_spiral(MAX_PROBE_DIRECTIONS),
            avoidance_window: 100,
            alive_count_ttl: 3.0,
        }
    }
}

impl FlockSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let non_negative = [
            ("perception_radius", self.perception_radius),
            ("avoidance_radius", self.avoidance_radius),
            ("target_weight", self.target_weight),
            ("align_weight", self.align_weight),
            ("cohesion_weight", self.cohesion_weight),
            ("separate_weight", self.separate_weight),
            ("min_speed", self.min_speed),
            ("max_steer_force", self.max_steer_force),
            ("avoid_collision_weight", self.avoid_collision_weight),
            ("bounds_radius", self.bounds_radius),
            ("collision_avoid_dst", self.collision_avoid_dst),
            ("alive_count_ttl", self.alive_count_ttl),
        ];

        for (name, value) in non_negative.into_iter().chain([("max_speed", self.max_speed)]) {
            if !value.is_finite() {
                return Err(SettingsError::NonFinite(name));
            }
        }
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(SettingsError::Negative { name, value });
            }
        }

        if self.max_speed <= 0.0 {
            return Err(SettingsError::NonPositiveMaxSpeed(self.max_speed));
        }
        if self.min_speed > self.max_speed {
            return Err(SettingsError::SpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.probe_directions.is_empty() {
            return Err(SettingsError::NoProbeDirections);
        }
        if self.avoidance_window == 0 {
            return Err(SettingsError::EmptyAvoidanceWindow);
        }

        Ok(())
    }
}

/// Reasons a [`FlockSettings`] value is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    NonFinite(&'static str),
    Negative { name: &'static str, value: f32 },
    NonPositiveMaxSpeed(f32),
    SpeedRange { min: f32, max: f32 },
    NoProbeDirections,
    EmptyAvoidanceWindow,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::NonFinite(name) => write!(f, "{} must be finite", name),
            SettingsError::Negative { name, value } => {
                write!(f, "{} must not be negative (got {})", name, value)
            }
            SettingsError::NonPositiveMaxSpeed(max) => {
                write!(f, "max_speed must be positive (got {})", max)
            }
            SettingsError::SpeedRange { min, max } => {
                write!(f, "min_speed {} exceeds max_speed {}", min, max)
            }
            SettingsError::NoProbeDirections => write!(f, "at least one probe direction is required"),
            SettingsError::EmptyAvoidanceWindow => write!(f, "avoidance_window must be at least 1"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SettingsError {}
