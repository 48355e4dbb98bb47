//! Scripted prober with per-endpoint delays

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use relfetch::release::catalog::parse_manifest;
use relfetch::release::probe::{ProbeOutcome, ProbeTarget, Prober};

use super::PRODUCT;

/// Prober answering from a fixed manifest after a configurable delay
pub struct FakeProber {
    manifest: String,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeProber {
    pub fn new(manifest: &str) -> Self {
        Self {
            manifest: manifest.to_string(),
            delays: HashMap::new(),
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.get(target.url()).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;

        if self.failing.contains(target.url()) {
            return ProbeOutcome::failed(target.kind(), delay);
        }

        match target {
            ProbeTarget::Mirror { origin, base_url } => ProbeOutcome::mirror(
                *origin,
                parse_manifest(&self.manifest, base_url, PRODUCT),
                delay,
            ),
            ProbeTarget::Reachability { .. } => ProbeOutcome::reachable(delay),
        }
    }
}
