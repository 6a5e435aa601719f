//! Headless host for the flock simulation: an analytic obstacle world, an
//! entity table standing in for a scene, and a scenario-driven run loop.

pub mod runner;
pub mod scenario;
pub mod world;

pub use runner::{RunSummary, Simulation};
pub use scenario::{load_scenario, parse_scenario, settings_from_config};
pub use world::{EntityTable, Obstacle, ObstacleWorld};
