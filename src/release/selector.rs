//! Origin and region selection from probe outcomes
//!
//! Origin priority is fixed: the primary mirror wins whenever it served a
//! non-empty catalog, regardless of which probe reported first.

use tracing::info;

use crate::release::catalog::ReleaseCatalog;
use crate::release::origin::{Origin, Region};
use crate::release::probe::{ProbeKind, ProbeOutcome};

/// Network conditions inferred from one probing race
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    /// Active origin, `None` when no mirror served a catalog
    pub origin: Option<Origin>,
    pub region: Region,
    pub internet_access: bool,
    /// Latest stable version, from the active catalog or the fallback
    pub latest_version: String,
    /// Catalog of the active origin, empty when there is none
    pub catalog: ReleaseCatalog,
    /// Number of completed refreshes that produced this state, 0 before the first
    pub generation: u64,
}

impl NetworkState {
    /// State before any probing has happened
    pub fn initial(default_latest: &str) -> Self {
        Self {
            origin: None,
            region: Region::Default,
            internet_access: false,
            latest_version: default_latest.to_string(),
            catalog: ReleaseCatalog::default(),
            generation: 0,
        }
    }

    pub fn is_probed(&self) -> bool {
        self.generation > 0
    }
}

/// Derives the network state from the outcomes of one race
///
/// Outcomes may arrive in any order and probes that missed the deadline are
/// simply absent. `fallback_latest` is kept when the active catalog has no
/// stable release.
pub fn select(outcomes: Vec<ProbeOutcome>, fallback_latest: &str) -> NetworkState {
    let mut reachability_ok = false;
    let mut catalogs: Vec<(Origin, ReleaseCatalog)> = Vec::new();

    for outcome in outcomes {
        match outcome.kind {
            ProbeKind::Reachability => reachability_ok |= outcome.success,
            ProbeKind::Mirror(origin) if outcome.has_catalog() => {
                if let Some(catalog) = outcome.catalog {
                    catalogs.push((origin, catalog));
                }
            }
            ProbeKind::Mirror(_) => {}
        }
    }

    let any_mirror_ok = !catalogs.is_empty();
    let active = Origin::PRIORITY.iter().find_map(|origin| {
        catalogs
            .iter()
            .position(|(o, _)| o == origin)
            .map(|i| catalogs.swap_remove(i))
    });

    let (origin, catalog) = match active {
        Some((origin, catalog)) => (Some(origin), catalog),
        None => (None, ReleaseCatalog::default()),
    };

    let internet_access = any_mirror_ok || reachability_ok;
    let region = if internet_access && !reachability_ok {
        Region::China
    } else {
        Region::Default
    };

    let latest_version = catalog
        .latest_stable()
        .map(|r| r.version().to_string())
        .unwrap_or_else(|| fallback_latest.to_string());

    info!(
        "Network state: origin={}, region={}, internet={}, latest={}",
        origin.map_or("none", |o| o.as_str()),
        region,
        internet_access,
        latest_version
    );

    NetworkState {
        origin,
        region,
        internet_access,
        latest_version,
        catalog,
        generation: 0,
    }
}
