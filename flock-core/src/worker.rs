//! Background thread computing the acceleration stage, so the host can overlap
//! its own frame work with the pairwise scan.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::behavior::compute_accelerations;
use crate::boid::Boid;
use crate::settings::FlockSettings;
use crate::vector::Vector3D;

/// Snapshot of one tick's acceleration input.
#[derive(Debug)]
pub(crate) struct AccelerationJob {
    pub snapshot: Vec<Boid>,
    pub target: Option<Vector3D>,
    pub settings: Arc<FlockSettings>,
}

impl AccelerationJob {
    pub fn run(self) -> AccelerationOutput {
        let mut accelerations = vec![Vector3D::zero(); self.snapshot.len()];
        compute_accelerations(&self.snapshot, self.target, &self.settings, &mut accelerations);
        AccelerationOutput {
            snapshot: self.snapshot,
            accelerations,
        }
    }
}

#[derive(Debug)]
pub(crate) struct AccelerationOutput {
    /// The job's snapshot, handed back so its allocation can be reused.
    pub snapshot: Vec<Boid>,
    pub accelerations: Vec<Vector3D>,
}

/// A dedicated `flock-accel` thread fed through channels. At most one job is
/// in flight at a time.
pub(crate) struct AccelerationWorker {
    jobs: Option<Sender<AccelerationJob>>,
    results: Receiver<AccelerationOutput>,
    handle: Option<JoinHandle<()>>,
}

impl AccelerationWorker {
    pub fn spawn() -> io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<AccelerationJob>();
        let (result_tx, result_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("flock-accel".to_string())
            .spawn(move || {
                for job in job_rx {
                    if result_tx.send(job.run()).is_err() {
                        break;
                    }
                }
                log::debug!("acceleration worker stopped");
            })?;

        log::debug!("acceleration worker started");
        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
        })
    }

    /// Hands `job` to the thread. Gives the job back if the thread is gone.
    pub fn submit(&self, job: AccelerationJob) -> Result<(), AccelerationJob> {
        match &self.jobs {
            Some(jobs) => jobs.send(job).map_err(|err| err.0),
            None => Err(job),
        }
    }

    /// Blocks until the submitted job finishes. `None` if the thread died.
    pub fn wait(&self) -> Option<AccelerationOutput> {
        self.results.recv().ok()
    }
}

impl Drop for AccelerationWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the thread's receive loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("acceleration worker panicked");
            }
        }
    }
}
