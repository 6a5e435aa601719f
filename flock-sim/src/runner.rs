use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use flock_core::{Flock, SpawnRequest, TickReport, Vector3D};
use flock_shared::{Scenario, TickStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::scenario::{obstacle_from_spec, settings_from_config, spawn_request, to_vector};
use crate::world::{EntityTable, ObstacleWorld};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_count: usize,
    pub alive_count: usize,
    pub total_avoided: usize,
    pub wall_time: Duration,
}

/// Headless host driving a flock through a scenario.
///
/// Events scheduled `at_tick` N are applied right before tick N runs.
pub struct Simulation {
    scenario: Scenario,
    flock: Flock,
    world: ObstacleWorld,
    entities: EntityTable,
    rng: StdRng,
    target: Option<Vector3D>,
    tick: u64,
    pipelined: bool,
}

impl Simulation {
    pub fn new(scenario: Scenario, pipelined: bool) -> Result<Self> {
        let settings = settings_from_config(&scenario.settings)?;
        let world = ObstacleWorld::new(scenario.obstacles.iter().map(obstacle_from_spec).collect());
        let mut entities = EntityTable::new();
        let mut rng = StdRng::seed_from_u64(scenario.seed);

        let mut flock = Flock::spawn_initial(
            settings,
            scenario.initial_count,
            to_vector(scenario.origin),
            &mut entities,
            &mut rng,
        )
        .context("Failed to create flock")?;

        if pipelined {
            flock
                .enable_worker()
                .context("Failed to start acceleration worker")?;
        }

        log::info!(
            "Simulation ready: {} boids, {} obstacles, dt {}",
            flock.len(),
            world.obstacles().len(),
            scenario.dt
        );

        Ok(Self {
            scenario,
            flock,
            world,
            entities,
            rng,
            target: None,
            tick: 0,
            pipelined,
        })
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    pub fn world(&self) -> &ObstacleWorld {
        &self.world
    }

    pub fn target(&self) -> Option<Vector3D> {
        self.target
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f32 {
        self.tick as f32 * self.scenario.dt
    }

    fn apply_events(&mut self) {
        let tick = self.tick;

        if let Some(update) = self.scenario.targets.iter().rev().find(|t| t.at_tick == tick) {
            self.target = update.position.map(to_vector);
            log::debug!("tick {}: target now {:?}", tick, self.target);
        }

        for kill in self.scenario.kills.iter().filter(|k| k.at_tick == tick) {
            let destroyed = self.entities.destroy_oldest(kill.count);
            log::debug!("tick {}: destroyed {} entities", tick, destroyed);
        }

        let requests: Vec<SpawnRequest> = self
            .scenario
            .spawns
            .iter()
            .filter(|s| s.at_tick == tick)
            .map(spawn_request)
            .collect();
        if !requests.is_empty() {
            self.flock.resize(&requests, &mut self.entities, &mut self.rng);
        }
    }

    /// Applies this tick's events, runs one tick and reports on it.
    pub fn step(&mut self) -> TickStatus {
        self.apply_events();

        let dt = self.scenario.dt;
        let report = if self.pipelined {
            let pending = self.flock.begin_tick(self.target);
            // Host-side frame work overlaps the acceleration stage here.
            let live = self.entities.live_count();
            log::trace!("tick {}: {} live entities while accelerations run", self.tick, live);
            pending.complete(dt, &self.world, &mut self.entities)
        } else {
            self.flock.tick(dt, &self.target, &self.world, &mut self.entities)
        };

        self.tick += 1;
        self.status(&report)
    }

    fn status(&mut self, report: &TickReport) -> TickStatus {
        let now = self.time();
        let alive_count = self.flock.alive_count(now, &self.entities);

        let mut sum = 0.0;
        let mut min_speed = f32::INFINITY;
        let mut max_speed: f32 = 0.0;
        let mut live = 0;
        for boid in self.flock.boids().iter().filter(|b| b.alive) {
            let speed = boid.speed();
            sum += speed;
            min_speed = min_speed.min(speed);
            max_speed = max_speed.max(speed);
            live += 1;
        }
        if live == 0 {
            min_speed = 0.0;
        }

        TickStatus {
            tick: self.tick,
            time: now,
            boid_count: self.flock.len(),
            alive_count,
            integrated: report.integrated,
            skipped: report.skipped,
            avoided: report.avoided,
            target_active: report.target_active,
            mean_speed: if live > 0 { sum / live as f32 } else { 0.0 },
            min_speed,
            max_speed,
        }
    }

    /// Runs `ticks` ticks, handing every `status_every`-th status (and the
    /// last one) to `on_status`.
    pub fn run<F>(&mut self, ticks: u64, status_every: u64, mut on_status: F) -> Result<RunSummary>
    where
        F: FnMut(&TickStatus) -> Result<()>,
    {
        let started = Instant::now();
        let status_every = status_every.max(1);
        let mut total_avoided = 0;
        let mut last = None;

        for i in 0..ticks {
            let status = self.step();
            total_avoided += status.avoided;
            if (i + 1) % status_every == 0 || i + 1 == ticks {
                on_status(&status)?;
            }
            last = Some(status);
        }

        let summary = RunSummary {
            ticks,
            final_count: self.flock.len(),
            alive_count: last.map(|s| s.alive_count).unwrap_or(self.flock.len()),
            total_avoided,
            wall_time: started.elapsed(),
        };
        log::info!(
            "Finished {} ticks in {:.2?}: {} boids ({} alive), {} avoidance overrides",
            summary.ticks,
            summary.wall_time,
            summary.final_count,
            summary.alive_count,
            summary.total_avoided
        );
        Ok(summary)
    }

    /// Stops the flock and releases its entities from the table.
    pub fn shutdown(self) -> EntityTable {
        let Simulation { flock, mut entities, .. } = self;
        let released = flock.shutdown();
        entities.release(&released);
        entities
    }
}
