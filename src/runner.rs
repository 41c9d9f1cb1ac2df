//! Dedicated physics thread.
//!
//! The thread owns the live [`World`] behind a lock and steps it at the
//! configured update rate. Other threads read published [`WorldSnapshot`]s and
//! queue edits; queued edits run at the start of the next tick, followed by a
//! `step(0)` so derived state reflects them before time advances.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{info, warn};
use parking_lot::{Mutex, RwLock};

use crate::{
    error::{Result, SandboxError},
    utils::logging::warn_if_step_budget_exceeded,
    world::{World, WorldSnapshot},
};

/// Edit scheduled for the physics thread.
pub type Edit = Box<dyn FnOnce(&mut World) + Send>;

struct Shared {
    world: Mutex<World>,
    snapshot: RwLock<Arc<WorldSnapshot>>,
    edits: Mutex<Vec<Edit>>,
    paused: AtomicBool,
    refresh: AtomicBool,
    running: AtomicBool,
    ticks: AtomicU64,
}

/// Handle to the thread stepping a world. Dropping it stops and joins the thread.
pub struct PhysicsThread {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl PhysicsThread {
    /// Moves `world` onto a new thread and starts stepping it.
    pub fn spawn(world: World) -> Result<Self> {
        let rate = world.settings().update_rate_hz;
        let paused = world.is_paused();
        let shared = Arc::new(Shared {
            snapshot: RwLock::new(Arc::new(world.snapshot())),
            world: Mutex::new(world),
            edits: Mutex::new(Vec::new()),
            paused: AtomicBool::new(paused),
            refresh: AtomicBool::new(false),
            running: AtomicBool::new(true),
            ticks: AtomicU64::new(0),
        });

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("sandbox-physics".to_string())
            .spawn(move || run(worker))
            .map_err(|err| SandboxError::ThreadSpawn(err.to_string()))?;

        info!("physics thread started at {rate} Hz");
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.shared.snapshot.read())
    }

    /// Queues `edit` to run on the physics thread before its next step.
    pub fn edit<F>(&self, edit: F)
    where
        F: FnOnce(&mut World) + Send + 'static,
    {
        self.shared.edits.lock().push(Box::new(edit));
    }

    pub fn set_paused(&self, paused: bool) {
        self.shared.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Asks for a `step(0)` on the next tick, e.g. after a settings change.
    pub fn request_refresh(&self) {
        self.shared.refresh.store(true, Ordering::Release);
    }

    /// Ticks completed so far, paused ones included.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// Stops the thread and hands the world back.
    pub fn shutdown(mut self) -> Option<World> {
        self.stop();
        let shared = Arc::clone(&self.shared);
        drop(self);
        Arc::try_unwrap(shared)
            .ok()
            .map(|shared| shared.world.into_inner())
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.shared.running.store(false, Ordering::Release);
        handle.thread().unpark();
        if handle.join().is_err() {
            warn!("physics thread panicked");
        }
        info!("physics thread stopped");
    }
}

impl Drop for PhysicsThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: Arc<Shared>) {
    while shared.running.load(Ordering::Acquire) {
        let start = Instant::now();
        let dt = tick(&shared);
        shared.ticks.fetch_add(1, Ordering::AcqRel);

        let budget = Duration::from_secs_f64(dt);
        let elapsed = start.elapsed();
        warn_if_step_budget_exceeded(elapsed, budget);
        if elapsed < budget {
            thread::park_timeout(budget - elapsed);
        }
    }
}

/// Applies queued edits, steps once and publishes a snapshot. Returns the timestep.
fn tick(shared: &Shared) -> f64 {
    let mut world = shared.world.lock();
    let dt = world.settings().time_step();

    let edits = std::mem::take(&mut *shared.edits.lock());
    let edited = !edits.is_empty();
    for edit in edits {
        edit(&mut *world);
    }

    let paused = shared.paused.load(Ordering::Acquire);
    world.set_paused(paused);
    if edited || shared.refresh.swap(false, Ordering::AcqRel) {
        world.step(0.0);
    }
    if !paused {
        world.step(dt);
    }

    *shared.snapshot.write() = Arc::new(world.snapshot());
    dt
}
