use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::engine::Simulation;
use super::types::Snapshot;
use crate::network::RoadNetworkPort;

/// Thread-safe handle to a [`Simulation`].
///
/// Stepping and snapshotting take the same lock, so a reader never sees a
/// half-applied tick. A lock poisoned by a panicking holder is recovered
/// rather than propagated.
#[derive(Debug)]
pub struct SharedSimulation<N: RoadNetworkPort> {
    inner: Arc<Mutex<Simulation<N>>>,
}

impl<N: RoadNetworkPort> Clone for SharedSimulation<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: RoadNetworkPort> SharedSimulation<N> {
    pub fn new(sim: Simulation<N>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sim)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Simulation<N>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advances one tick under the lock.
    pub fn step(&self) -> Snapshot {
        self.lock().step()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Runs `f` with exclusive access to the simulation.
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulation<N>) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::config::ScenarioConfig;

    #[test]
    fn concurrent_steps_are_serialized() {
        let sim = Simulation::from_config(&ScenarioConfig::small()).unwrap();
        let shared = SharedSimulation::new(sim);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = shared.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        s.step();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.snapshot().tick, 20);
    }

    #[test]
    fn with_exposes_the_simulation() {
        let shared = SharedSimulation::new(
            Simulation::from_config(&ScenarioConfig::small()).unwrap(),
        );
        let vehicles = shared.with(|sim| sim.world().vehicles.len());
        assert_eq!(vehicles, 3);
    }
}
