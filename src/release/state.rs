//! Process-wide network state with a single-writer update path
//!
//! Readers take an `Arc` snapshot and never observe a partially updated
//! state. Writers serialize on an async gate; a caller that queued behind an
//! in-flight refresh is served that refresh's result instead of probing again.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::release::probe::{ProbeTarget, Prober, race};
use crate::release::selector::{NetworkState, select};

pub struct NetworkMonitor {
    prober: Arc<dyn Prober>,
    targets: Vec<ProbeTarget>,
    current: RwLock<Arc<NetworkState>>,
    gate: Mutex<()>,
}

impl NetworkMonitor {
    pub fn new(prober: Arc<dyn Prober>, targets: Vec<ProbeTarget>, default_latest: &str) -> Self {
        Self {
            prober,
            targets,
            current: RwLock::new(Arc::new(NetworkState::initial(default_latest))),
            gate: Mutex::new(()),
        }
    }

    /// Latest published state
    pub fn snapshot(&self) -> Arc<NetworkState> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Acquires the single-writer gate
    pub async fn writer(&self) -> StateWriter<'_> {
        StateWriter {
            monitor: self,
            _gate: self.gate.lock().await,
        }
    }

    /// Probes all targets and publishes the resulting state
    pub async fn refresh(&self, timeout: Duration) -> Arc<NetworkState> {
        let seen = self.snapshot().generation;
        let writer = self.writer().await;

        let current = writer.current();
        if current.generation > seen {
            debug!(
                "Reusing network state generation {} refreshed while waiting",
                current.generation
            );
            return current;
        }

        let outcomes = race(Arc::clone(&self.prober), self.targets.clone(), timeout).await;
        writer.publish(select(outcomes, &current.latest_version))
    }

    /// Returns the current state, probing first if nothing has been probed yet
    pub async fn ensure_probed(&self, timeout: Duration) -> Arc<NetworkState> {
        let snapshot = self.snapshot();
        if snapshot.is_probed() {
            snapshot
        } else {
            self.refresh(timeout).await
        }
    }

    fn store(&self, state: Arc<NetworkState>) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = state;
    }
}

/// Exclusive write access to the network state
pub struct StateWriter<'a> {
    monitor: &'a NetworkMonitor,
    _gate: MutexGuard<'a, ()>,
}

impl StateWriter<'_> {
    pub fn current(&self) -> Arc<NetworkState> {
        self.monitor.snapshot()
    }

    /// Publishes `next` as the newest state, stamping the next generation
    pub fn publish(&self, mut next: NetworkState) -> Arc<NetworkState> {
        next.generation = self.current().generation + 1;
        let next = Arc::new(next);
        self.monitor.store(Arc::clone(&next));
        next
    }
}
