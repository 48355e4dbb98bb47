//! Concurrent endpoint probing
//!
//! Every target is probed on its own task. Outcomes are collected through a
//! single channel until all targets have reported or the shared deadline
//! elapses, whichever comes first. Stragglers are cancelled and their results
//! are dropped with the receiving end of the channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::release::catalog::{ReleaseCatalog, fetch_manifest};
use crate::release::error::ProbeError;
use crate::release::origin::{Mirrors, Origin};

/// One endpoint to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeTarget {
    /// Mirror origin serving a checksum manifest
    Mirror { origin: Origin, base_url: String },
    /// General-purpose external host, checked for reachability only
    Reachability { url: String },
}

impl ProbeTarget {
    pub fn kind(&self) -> ProbeKind {
        match self {
            ProbeTarget::Mirror { origin, .. } => ProbeKind::Mirror(*origin),
            ProbeTarget::Reachability { .. } => ProbeKind::Reachability,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ProbeTarget::Mirror { base_url, .. } => base_url,
            ProbeTarget::Reachability { url } => url,
        }
    }

    /// Both mirrors plus the reachability target
    pub fn standard_set(mirrors: &Mirrors, reachability_url: &str) -> Vec<ProbeTarget> {
        std::iter::once(ProbeTarget::Reachability {
            url: reachability_url.to_string(),
        })
        .chain(Origin::PRIORITY.iter().map(|origin| ProbeTarget::Mirror {
            origin: *origin,
            base_url: mirrors.base_url(*origin).to_string(),
        }))
        .collect()
    }
}

/// Identifies which endpoint an outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Mirror(Origin),
    Reachability,
}

/// Result of probing one endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub kind: ProbeKind,
    pub success: bool,
    /// Parsed catalog, present only for successful mirror probes
    pub catalog: Option<ReleaseCatalog>,
    pub latency: Duration,
}

impl ProbeOutcome {
    pub fn mirror(origin: Origin, catalog: ReleaseCatalog, latency: Duration) -> Self {
        Self {
            kind: ProbeKind::Mirror(origin),
            success: true,
            catalog: Some(catalog),
            latency,
        }
    }

    pub fn reachable(latency: Duration) -> Self {
        Self {
            kind: ProbeKind::Reachability,
            success: true,
            catalog: None,
            latency,
        }
    }

    pub fn failed(kind: ProbeKind, latency: Duration) -> Self {
        Self {
            kind,
            success: false,
            catalog: None,
            latency,
        }
    }

    /// Returns true for a successful probe that yielded at least one release
    ///
    /// An empty catalog counts as a failure for origin selection.
    pub fn has_catalog(&self) -> bool {
        self.success && self.catalog.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Trait for probing a single endpoint
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probes `target`, folding every failure into the returned outcome
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome;
}

/// Prober backed by a bounded-timeout HTTP client
pub struct HttpProber {
    client: reqwest::Client,
    product: String,
}

impl HttpProber {
    /// Creates a prober for `product` mirrors
    ///
    /// Requests carry no timeout of their own; they are bounded by the
    /// deadline of the race that runs them.
    pub fn new(product: &str, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            client,
            product: product.to_string(),
        })
    }

    async fn probe_mirror(&self, base_url: &str) -> Result<ReleaseCatalog, ProbeError> {
        fetch_manifest(&self.client, base_url, &self.product)
            .await
            .map_err(|e| ProbeError::EndpointUnreachable {
                url: base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn probe_reachability(&self, url: &str) -> Result<(), ProbeError> {
        let unreachable = |reason: String| ProbeError::EndpointUnreachable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(unreachable(format!("status {}", response.status())))
        }
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        let start = Instant::now();

        match target {
            ProbeTarget::Mirror { origin, base_url } => {
                match self.probe_mirror(base_url).await {
                    Ok(catalog) => {
                        debug!(
                            "{} ping ok: {} ms, {} releases",
                            origin,
                            start.elapsed().as_millis(),
                            catalog.len()
                        );
                        ProbeOutcome::mirror(*origin, catalog, start.elapsed())
                    }
                    Err(e) => {
                        debug!("{} probe failed: {}", origin, e);
                        ProbeOutcome::failed(target.kind(), start.elapsed())
                    }
                }
            }
            ProbeTarget::Reachability { url } => match self.probe_reachability(url).await {
                Ok(()) => {
                    debug!("{} ping ok: {} ms", url, start.elapsed().as_millis());
                    ProbeOutcome::reachable(start.elapsed())
                }
                Err(e) => {
                    debug!("Reachability probe failed: {}", e);
                    ProbeOutcome::failed(target.kind(), start.elapsed())
                }
            },
        }
    }
}

/// Probes all targets concurrently and collects outcomes until every target
/// has reported or `deadline` elapses
///
/// Outcomes are returned in arrival order. Targets that have not reported by
/// the deadline are cancelled and contribute no outcome.
pub async fn race(
    prober: Arc<dyn Prober>,
    targets: Vec<ProbeTarget>,
    deadline: Duration,
) -> Vec<ProbeOutcome> {
    let expected = targets.len();
    let token = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(expected.max(1));

    for target in targets {
        let prober = Arc::clone(&prober);
        let tx = tx.clone();
        let token = token.child_token();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Probe of {} abandoned at deadline", target.url());
                }
                outcome = prober.probe(&target) => {
                    // The receiver is gone once the race has returned.
                    let _ = tx.send(outcome).await;
                }
            }
        });
    }
    drop(tx);

    let mut outcomes = Vec::with_capacity(expected);
    let collect = async {
        while outcomes.len() < expected {
            match rx.recv().await {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }
    };

    if tokio::time::timeout(deadline, collect).await.is_err() {
        debug!(
            "Probe deadline of {} ms elapsed with {}/{} outcomes",
            deadline.as_millis(),
            outcomes.len(),
            expected
        );
    }

    token.cancel();
    outcomes
}
