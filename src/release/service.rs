//! Entry point tying probing, resolution and downloads together

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::release::catalog::fetch_manifest;
use crate::release::download::{DownloadOutcome, Downloader};
use crate::release::error::{CatalogError, ServiceError};
use crate::release::origin::Mirrors;
use crate::release::probe::{HttpProber, ProbeTarget, Prober};
use crate::release::progress::ProgressReporter;
use crate::release::resolver::VersionResolver;
use crate::release::selector::NetworkState;
use crate::release::state::NetworkMonitor;
use crate::release::version::{ReleaseVersion, normalize, parse_canonical};

pub struct ReleaseService {
    config: Config,
    mirrors: Mirrors,
    client: reqwest::Client,
    monitor: NetworkMonitor,
    resolver: VersionResolver,
    downloader: Downloader,
}

impl ReleaseService {
    /// Creates a service probing over HTTP
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        let prober = HttpProber::new(&config.product, crate::config::USER_AGENT)?;
        Self::with_prober(config, Arc::new(prober))
    }

    /// Creates a service using a custom prober
    pub fn with_prober(config: Config, prober: Arc<dyn Prober>) -> Result<Self, ServiceError> {
        let mirrors = Mirrors::from(&config.mirrors);
        let connect_timeout = Duration::from_millis(config.download.connect_timeout_ms);

        let client = reqwest::Client::builder()
            .user_agent(crate::config::USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()?;
        let targets = ProbeTarget::standard_set(&mirrors, &config.reachability_url);
        let monitor = NetworkMonitor::new(prober, targets, &config.default_latest_version);
        let resolver = VersionResolver::new(mirrors.clone(), &config.product);
        let downloader =
            Downloader::new(&config.product, crate::config::USER_AGENT, connect_timeout)?;

        Ok(Self {
            config,
            mirrors,
            client,
            monitor,
            resolver,
            downloader,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current network state without probing
    pub fn snapshot(&self) -> Arc<NetworkState> {
        self.monitor.snapshot()
    }

    /// Configured deadline for one probing race
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.config.probe.timeout_ms)
    }

    /// Races all probes under `timeout` and publishes the resulting state
    pub async fn refresh_network_state(&self, timeout: Duration) -> Arc<NetworkState> {
        self.monitor.refresh(timeout).await
    }

    /// Resolves `requested`, probing first if nothing is known yet
    ///
    /// Invalid input is rejected before any probing. When no mirror answers,
    /// the result is a synthetic entry built from the compiled defaults.
    pub async fn resolve_version(&self, requested: &str) -> Result<ReleaseVersion, ServiceError> {
        parse_canonical(requested)?;
        let state = self.monitor.ensure_probed(self.probe_timeout()).await;
        Ok(self.resolver.resolve(&state, requested)?)
    }

    /// Completes a partial version, probing first if nothing is known yet
    pub async fn complete_version(&self, input: &str) -> String {
        let state = self.monitor.ensure_probed(self.probe_timeout()).await;
        self.resolver.complete(&state, input)
    }

    /// Lists catalogued releases not older than `since`
    ///
    /// An empty `since` uses the configured floor.
    pub async fn list_catalog(&self, since: &str) -> Vec<ReleaseVersion> {
        let floor = if since.trim().is_empty() {
            normalize(&self.config.list_since)
        } else {
            normalize(since.trim())
        };

        let state = self.monitor.ensure_probed(self.probe_timeout()).await;
        state.catalog.since(&floor)
    }

    /// Refetches the catalog from the active origin, replacing the cached one
    pub async fn fetch_catalog(&self) -> Result<Arc<NetworkState>, ServiceError> {
        let writer = self.monitor.writer().await;
        let current = writer.current();
        let origin = current.origin.ok_or(CatalogError::NoOrigin)?;

        let base_url = self.mirrors.base_url(origin);
        let catalog = fetch_manifest(&self.client, base_url, &self.config.product).await?;
        info!("Fetched {} releases from {}", catalog.len(), base_url);

        let mut next = (*current).clone();
        if let Some(latest) = catalog.latest_stable() {
            next.latest_version = latest.version().to_string();
        }
        next.catalog = catalog;

        Ok(writer.publish(next))
    }

    /// Downloads `release` into `target_dir`, verifying its checksum when known
    pub async fn download(
        &self,
        release: &ReleaseVersion,
        target_dir: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> Result<DownloadOutcome, ServiceError> {
        Ok(self
            .downloader
            .download(release, target_dir, progress)
            .await?)
    }
}
