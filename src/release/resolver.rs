//! Resolution of requested version strings to concrete release targets

use tracing::debug;

use crate::release::error::VersionError;
use crate::release::origin::Mirrors;
use crate::release::selector::NetworkState;
use crate::release::version::{ReleaseVersion, parse_canonical};

/// Resolves versions against a network state snapshot
#[derive(Debug, Clone)]
pub struct VersionResolver {
    mirrors: Mirrors,
    product: String,
}

impl VersionResolver {
    pub fn new(mirrors: Mirrors, product: &str) -> Self {
        Self {
            mirrors,
            product: product.to_string(),
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Resolves `requested` to a catalogued release or a synthetic entry
    ///
    /// Synthetic entries carry no checksum and point at the active origin,
    /// or at the region's default mirror when no origin is active.
    pub fn resolve(
        &self,
        state: &NetworkState,
        requested: &str,
    ) -> Result<ReleaseVersion, VersionError> {
        let version = parse_canonical(requested)?;

        if let Some(release) = state.catalog.find(&version) {
            return Ok(release.clone());
        }

        let base_url = self.mirrors.fallback_base_url(state.origin, state.region);
        debug!(
            "Version {} not catalogued, synthesizing entry from {}",
            version, base_url
        );
        ReleaseVersion::synthetic(&version, base_url, &self.product)
    }

    /// Completes a partial version (`v3`, `3.1`, `latest`) against the snapshot
    pub fn complete(&self, state: &NetworkState, input: &str) -> String {
        state.catalog.complete(input, &state.latest_version)
    }
}
