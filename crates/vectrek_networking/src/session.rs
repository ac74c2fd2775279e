//! # Session Runner
//!
//! Drives one [`World`] on a dedicated simulation thread at a fixed rate.
//!
//! The simulation thread is the only writer. Everyone else (renderers,
//! status printers, tests) gets the shared world through
//! [`SessionHandle::world`] and holds the lock only long enough to read.
//! A stop request is honoured between ticks; a tick in progress always
//! finishes.

use crate::tick::{TickLoop, TickStats};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use vectrek_core::World;

/// Spawns simulation threads.
pub struct Session;

impl Session {
    /// Moves `world` onto a new thread ticking `tick_rate` times per second.
    ///
    /// # Errors
    ///
    /// Thread spawn failure.
    pub fn spawn(world: World, tick_rate: u32) -> io::Result<SessionHandle> {
        let name = format!("sim-{}", world.name());
        let world = Arc::new(Mutex::new(world));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let world = Arc::clone(&world);
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name(name)
                .spawn(move || run(&world, &stop, TickLoop::new(tick_rate)))?
        };

        Ok(SessionHandle {
            world,
            stop,
            thread: Some(thread),
        })
    }
}

fn run(world: &Mutex<World>, stop: &AtomicBool, mut tick_loop: TickLoop) -> TickStats {
    tracing::info!(
        world = %world.lock().name(),
        tick_us = tick_loop.tick_duration().as_micros() as u64,
        "session started"
    );

    'outer: while !stop.load(Ordering::Acquire) {
        tick_loop.wait_for_next_tick();

        while tick_loop.should_tick() {
            if stop.load(Ordering::Acquire) {
                break 'outer;
            }
            let start = tick_loop.begin_tick();
            let mut world = world.lock();
            if let Err(errors) = world.update() {
                tracing::warn!(
                    world = %world.name(),
                    tick = world.tick(),
                    count = errors.len(),
                    "tick errors:\n{errors}"
                );
            }
            drop(world);
            tick_loop.end_tick(start);
        }
    }

    let stats = *tick_loop.stats();
    tracing::info!(
        world = %world.lock().name(),
        ticks = stats.total_ticks,
        late = stats.late_ticks,
        "session stopped"
    );
    stats
}

/// Owns a running session. Dropping it stops the session as well.
#[derive(Debug)]
pub struct SessionHandle {
    world: Arc<Mutex<World>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<TickStats>>,
}

impl SessionHandle {
    /// The shared world. Lock it briefly; the simulation waits on the lock.
    #[must_use]
    pub fn world(&self) -> Arc<Mutex<World>> {
        Arc::clone(&self.world)
    }

    /// True until the simulation thread exits.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops after the current tick and waits for the thread.
    ///
    /// Returns the final timing statistics, or `None` if the simulation
    /// thread panicked.
    pub fn stop(mut self) -> Option<TickStats> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<TickStats> {
        self.stop.store(true, Ordering::Release);
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                tracing::error!("simulation thread panicked");
                None
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
