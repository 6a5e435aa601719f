//! The flock container and its tick pipeline.

use std::io;
use std::mem;
use std::sync::Arc;

use rand::Rng;

use crate::avoidance::{apply_collision_avoidance, AvoidanceWindow};
use crate::boid::Boid;
use crate::host::{EntityHost, EntityId, ObstacleQuery, TargetProvider};
use crate::integrate::integrate;
use crate::population::{random_in_unit_sphere, AliveCountCache, ResizeReport, SpawnRequest};
use crate::settings::{FlockSettings, SettingsError};
use crate::vector::{Orientation, Vector3D};
use crate::worker::{AccelerationJob, AccelerationOutput, AccelerationWorker};

/// Outcome of one completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub integrated: usize,
    pub skipped: usize,
    /// Boids whose steering was replaced by obstacle avoidance.
    pub avoided: usize,
    pub target_active: bool,
}

/// A collection of boids plus the settings they fly by.
///
/// The flock owns its boid storage; hosts read positions through
/// [`Flock::boids`] and never write them.
pub struct Flock {
    boids: Vec<Boid>,
    settings: Arc<FlockSettings>,
    window: AvoidanceWindow,
    alive: AliveCountCache,
    worker: Option<AccelerationWorker>,
    /// Reused snapshot buffer for the acceleration job.
    snapshot: Vec<Boid>,
}

impl Flock {
    pub fn new(settings: FlockSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            boids: Vec::new(),
            settings: Arc::new(settings),
            window: AvoidanceWindow::new(),
            alive: AliveCountCache::new(),
            worker: None,
            snapshot: Vec::new(),
        })
    }

    /// Creates `count` boids at `origin` with velocities drawn from inside the
    /// unit sphere.
    pub fn spawn_initial<H, R>(
        settings: FlockSettings,
        count: usize,
        origin: Vector3D,
        host: &mut H,
        rng: &mut R,
    ) -> Result<Self, SettingsError>
    where
        H: EntityHost + ?Sized,
        R: Rng + ?Sized,
    {
        let mut flock = Self::new(settings)?;
        flock.boids.reserve(count);
        for _ in 0..count {
            let velocity = random_in_unit_sphere(rng);
            let entity = host.spawn(origin, Orientation::look_rotation(velocity));
            flock.boids.push(Boid::new(entity, origin, velocity));
        }
        flock.alive.set_count(count);
        log::debug!("flock created with {} boids", count);
        Ok(flock)
    }

    /// Moves acceleration computation onto a background thread.
    pub fn enable_worker(&mut self) -> io::Result<()> {
        if self.worker.is_none() {
            self.worker = Some(AccelerationWorker::spawn()?);
        }
        Ok(())
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    pub fn settings(&self) -> &FlockSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: FlockSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.settings = Arc::new(settings);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn position(&self, index: usize) -> Option<Vector3D> {
        self.boids.get(index).map(|boid| boid.position)
    }

    pub fn positions(&self) -> impl Iterator<Item = Vector3D> + '_ {
        self.boids.iter().map(|boid| boid.position)
    }

    pub fn avoidance_window(&self) -> AvoidanceWindow {
        self.window
    }

    /// Snapshots the boids and submits the acceleration stage.
    ///
    /// With a worker the computation starts immediately on its thread and
    /// the caller is free until [`PendingTick::complete`]. The pending tick
    /// holds the flock exclusively, so nothing can resize it mid-tick.
    pub fn begin_tick(&mut self, target: Option<Vector3D>) -> PendingTick<'_> {
        let mut snapshot = mem::take(&mut self.snapshot);
        snapshot.clear();
        snapshot.extend_from_slice(&self.boids);

        let job = AccelerationJob {
            snapshot,
            target,
            settings: Arc::clone(&self.settings),
        };

        let (state, worker_failed) = match self.worker.as_ref() {
            Some(worker) => match worker.submit(job) {
                Ok(()) => (TickState::Dispatched, false),
                Err(job) => (TickState::Inline(job), true),
            },
            None => (TickState::Inline(job), false),
        };
        if worker_failed {
            log::warn!("acceleration worker is gone, computing inline");
            self.worker = None;
        }

        PendingTick {
            flock: self,
            target,
            state: Some(state),
        }
    }

    /// Runs a whole tick on the calling thread (or the worker, if enabled)
    /// and waits for it.
    pub fn tick<T, Q, H>(&mut self, dt: f32, target: &T, obstacles: &Q, host: &mut H) -> TickReport
    where
        T: TargetProvider + ?Sized,
        Q: ObstacleQuery + ?Sized,
        H: EntityHost + ?Sized,
    {
        self.begin_tick(target.target_position()).complete(dt, obstacles, host)
    }

    /// Compacts destroyed boids out and appends the requested spawns.
    ///
    /// Survivors keep their order and exact state.
    pub fn resize<H, R>(&mut self, requests: &[SpawnRequest], host: &mut H, rng: &mut R) -> ResizeReport
    where
        H: EntityHost + ?Sized,
        R: Rng + ?Sized,
    {
        let requested: usize = requests.iter().map(|request| request.count).sum();
        let survivors_hint = self.alive.cached().unwrap_or(self.boids.len());
        let mut next = Vec::with_capacity(survivors_hint + requested);

        next.extend(
            self.boids
                .iter()
                .filter(|boid| boid.alive && host.is_valid(boid.entity))
                .copied(),
        );
        let removed = self.boids.len() - next.len();

        for request in requests {
            let orientation = Orientation::look_rotation(request.velocity);
            for _ in 0..request.count {
                let position = request.spawn_position(rng);
                let entity = host.spawn(position, orientation);
                next.push(Boid::new(entity, position, request.velocity));
            }
        }

        self.boids = next;
        self.window.clamp(self.boids.len());
        self.alive.set_count(self.boids.len());

        let report = ResizeReport {
            removed,
            added: requested,
            total: self.boids.len(),
        };
        log::debug!(
            "flock resized: {} removed, {} added, {} total",
            report.removed,
            report.added,
            report.total
        );
        report
    }

    pub fn spawn<H, R>(&mut self, request: SpawnRequest, host: &mut H, rng: &mut R) -> ResizeReport
    where
        H: EntityHost + ?Sized,
        R: Rng + ?Sized,
    {
        self.resize(&[request], host, rng)
    }

    /// Number of boids whose entity still exists, recounted at most once per
    /// `alive_count_ttl` seconds.
    pub fn alive_count<H: EntityHost + ?Sized>(&mut self, now: f32, host: &H) -> usize {
        let ttl = self.settings.alive_count_ttl;
        let boids = &self.boids;
        self.alive.get_or_refresh(now, ttl, || {
            boids
                .iter()
                .filter(|boid| boid.alive && host.is_valid(boid.entity))
                .count()
        })
    }

    /// Releases the flock, returning the entities of every live boid so the
    /// host can dispose of them.
    pub fn shutdown(mut self) -> Vec<EntityId> {
        self.worker = None;
        let entities: Vec<EntityId> = self
            .boids
            .iter()
            .filter(|boid| boid.alive)
            .map(|boid| boid.entity)
            .collect();
        log::debug!("flock shut down, releasing {} entities", entities.len());
        entities
    }

    fn store_accelerations(&mut self, output: AccelerationOutput) {
        for (boid, acceleration) in self.boids.iter_mut().zip(&output.accelerations) {
            boid.acceleration = *acceleration;
        }
        self.snapshot = output.snapshot;
    }
}

enum TickState {
    Dispatched,
    Inline(AccelerationJob),
}

/// A tick whose acceleration stage has been submitted.
///
/// Completing it waits for the accelerations, then runs obstacle avoidance
/// and integration on the calling thread. Dropping it waits for the worker
/// and discards the tick.
pub struct PendingTick<'a> {
    flock: &'a mut Flock,
    target: Option<Vector3D>,
    state: Option<TickState>,
}

impl PendingTick<'_> {
    pub fn complete<Q, H>(mut self, dt: f32, obstacles: &Q, host: &mut H) -> TickReport
    where
        Q: ObstacleQuery + ?Sized,
        H: EntityHost + ?Sized,
    {
        let output = match self.state.take() {
            Some(TickState::Dispatched) => self.wait_for_worker(),
            Some(TickState::Inline(job)) => job.run(),
            None => return TickReport::default(),
        };

        let flock = &mut *self.flock;
        flock.store_accelerations(output);

        let avoided = apply_collision_avoidance(
            &mut flock.boids,
            &mut flock.window,
            &flock.settings,
            obstacles,
            &*host,
        );
        let integration = integrate(&mut flock.boids, dt, &flock.settings, host);

        TickReport {
            integrated: integration.integrated,
            skipped: integration.skipped,
            avoided,
            target_active: self.target.is_some(),
        }
    }

    fn wait_for_worker(&mut self) -> AccelerationOutput {
        if let Some(output) = self.flock.worker.as_ref().and_then(|worker| worker.wait()) {
            return output;
        }

        log::warn!("acceleration worker died mid-tick, recomputing inline");
        self.flock.worker = None;
        AccelerationJob {
            snapshot: self.flock.boids.clone(),
            target: self.target,
            settings: Arc::clone(&self.flock.settings),
        }
        .run()
    }
}

impl Drop for PendingTick<'_> {
    fn drop(&mut self) {
        if let Some(TickState::Dispatched) = self.state.take() {
            if let Some(output) = self.flock.worker.as_ref().and_then(|worker| worker.wait()) {
                self.flock.snapshot = output.snapshot;
            }
        }
    }
}
