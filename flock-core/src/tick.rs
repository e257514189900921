//! Two-phase tick handoff between the parallel force pass and the
//! single-threaded apply phase.
//!
//! The flock itself is the token: the worker owns it while computing, sends it
//! through a one-slot channel, and waits until the consumer sends it back
//! after resizing and integrating. Neither side can touch the agents while the
//! other holds them.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::Controls;
use crate::error::{Result, TickError};
use crate::flock::Flock;
use crate::render::Frame;

pub struct TickCoordinator {
    controls: Arc<Controls>,
    ready: Receiver<Flock>,
    done: Option<SyncSender<Flock>>,
    worker: Option<JoinHandle<()>>,
}

impl TickCoordinator {
    /// Starts the compute worker on `flock`, reading parameters and bounds
    /// from `controls` at the start of every pass.
    pub fn spawn(flock: Flock, controls: Arc<Controls>) -> Result<Self> {
        let (ready_tx, ready) = mpsc::sync_channel::<Flock>(1);
        let (done, done_rx) = mpsc::sync_channel::<Flock>(1);

        let worker_controls = Arc::clone(&controls);
        let worker = thread::Builder::new()
            .name("flock-compute".into())
            .spawn(move || compute_loop(flock, &worker_controls, ready_tx, done_rx))?;

        Ok(Self {
            controls,
            ready,
            done: Some(done),
            worker: Some(worker),
        })
    }

    pub fn controls(&self) -> &Arc<Controls> {
        &self.controls
    }

    /// Runs the apply phase if a force pass is ready, otherwise returns
    /// `Ok(None)` without waiting.
    pub fn try_tick(&mut self) -> Result<Option<Frame>> {
        match self.ready.try_recv() {
            Ok(flock) => self.apply(flock).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TickError::WorkerStopped),
        }
    }

    /// Waits for the next force pass and runs the apply phase on it.
    pub fn tick(&mut self) -> Result<Frame> {
        let flock = self.ready.recv().map_err(|_| TickError::WorkerStopped)?;
        self.apply(flock)
    }

    fn apply(&mut self, mut flock: Flock) -> Result<Frame> {
        let config = self.controls.config();
        let bounds = self.controls.bounds();
        let frame = flock.apply(&config, bounds);

        let done = self.done.as_ref().ok_or(TickError::WorkerStopped)?;
        done.send(flock).map_err(|_| TickError::WorkerStopped)?;
        Ok(frame)
    }
}

impl Drop for TickCoordinator {
    fn drop(&mut self) {
        // Disconnecting the return slot ends the worker after its current pass.
        self.done.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Compute worker panicked");
            }
        }
    }
}

fn compute_loop(mut flock: Flock, controls: &Controls, ready: SyncSender<Flock>, done: Receiver<Flock>) {
    log::info!("Compute worker started with {} agents", flock.len());

    loop {
        let config = controls.config();
        let bounds = controls.bounds();
        flock.compute_forces(&config, bounds);

        if ready.send(flock).is_err() {
            break;
        }
        flock = match done.recv() {
            Ok(flock) => flock,
            Err(_) => break,
        };
    }

    log::info!("Compute worker stopped");
}
