//! Release catalog built from an origin's checksum manifest
//!
//! A manifest lists one artifact per line as `<checksum> <filename>`.
//! Lines with any other shape, or whose filename does not parse, are skipped.

use tracing::{debug, warn};

use crate::release::compare::{compare_versions, complete_version};
use crate::release::error::CatalogError;
use crate::release::version::{ReleaseVersion, SOURCE_SEGMENT, artifact_url, parse_filename};

/// Name of the manifest published under the source segment of every origin
pub const MANIFEST_NAME: &str = "checksums";

/// Releases ordered newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseCatalog {
    releases: Vec<ReleaseVersion>,
}

impl ReleaseCatalog {
    /// Creates a catalog, sorting the releases newest first
    pub fn new(mut releases: Vec<ReleaseVersion>) -> Self {
        releases.sort_by(|a, b| compare_versions(b.version(), a.version()));
        Self { releases }
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReleaseVersion> {
        self.releases.iter()
    }

    /// Finds the entry whose version string equals `version` exactly
    pub fn find(&self, version: &str) -> Option<&ReleaseVersion> {
        self.releases.iter().find(|r| r.version() == version)
    }

    /// Most recent release without a pre-release suffix
    pub fn latest_stable(&self) -> Option<&ReleaseVersion> {
        self.releases.iter().find(|r| !r.is_prerelease())
    }

    /// Releases at least as new as `floor`, newest first
    pub fn since(&self, floor: &str) -> Vec<ReleaseVersion> {
        self.releases
            .iter()
            .filter(|r| compare_versions(r.version(), floor).is_ge())
            .cloned()
            .collect()
    }

    /// Completes a partial version against this catalog
    pub fn complete(&self, input: &str, latest_stable: &str) -> String {
        complete_version(
            input,
            self.releases.iter().map(ReleaseVersion::version),
            latest_stable,
        )
    }
}

/// URL of the manifest served by an origin
pub fn manifest_url(base_url: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        SOURCE_SEGMENT,
        MANIFEST_NAME
    )
}

/// Parses manifest content into a catalog whose URLs point at `base_url`
///
/// A manifest with no valid entries yields an empty catalog.
pub fn parse_manifest(content: &str, base_url: &str, product: &str) -> ReleaseCatalog {
    let releases = content
        .lines()
        .filter_map(|line| parse_line(line, base_url, product))
        .collect();

    ReleaseCatalog::new(releases)
}

fn parse_line(line: &str, base_url: &str, product: &str) -> Option<ReleaseVersion> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [checksum, filename] = fields.as_slice() else {
        return None;
    };

    let version = parse_filename(product, filename)
        .inspect_err(|e| debug!("Skipping manifest entry: {}", e))
        .ok()?;

    ReleaseVersion::new(&version, checksum, &artifact_url(base_url, filename))
        .inspect_err(|e| debug!("Skipping manifest entry: {}", e))
        .ok()
}

/// Fetches and parses the manifest served by `base_url`
pub async fn fetch_manifest(
    client: &reqwest::Client,
    base_url: &str,
    product: &str,
) -> Result<ReleaseCatalog, CatalogError> {
    let url = manifest_url(base_url);
    let response = client.get(&url).send().await?;

    let status = response.status();
    if !status.is_success() {
        warn!("Manifest request returned status {}: {}", status, url);
        return Err(CatalogError::Status {
            status: status.as_u16(),
            url,
        });
    }

    let content = response.text().await?;
    let catalog = parse_manifest(&content, base_url, product);
    debug!("Parsed {} releases from {}", catalog.len(), url);

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const BASE_URL: &str = "https://repo.example.com";

    fn versions(catalog: &ReleaseCatalog) -> Vec<&str> {
        catalog.iter().map(ReleaseVersion::version).collect()
    }

    #[test]
    fn parse_manifest_skips_garbage_and_sorts_newest_first() {
        let content = "\
d41d8cd98f00b204e9800998ecf8427e product-v1.0.0.tgz
garbage line
0cc175b9c0f1b6a831c399e269772661 product-v2.0.0.tgz";

        let catalog = parse_manifest(content, BASE_URL, "product");

        assert_eq!(versions(&catalog), vec!["v2.0.0", "v1.0.0"]);
        assert_eq!(
            catalog.find("v1.0.0").unwrap().download_url(),
            "https://repo.example.com/src/product-v1.0.0.tgz"
        );
        assert_eq!(
            catalog.find("v2.0.0").unwrap().checksum(),
            "0cc175b9c0f1b6a831c399e269772661"
        );
    }

    #[test]
    fn parse_manifest_handles_realistic_listing() {
        let content = "
649c7b9f778c61324cb6d350dbda4f5e  pigsty-v0.8.0.tgz
8436905916465e74bfcb3d8192c11c85  pigsty-v0.9.0.tgz
0b9958a9305775a703a990d7c6728c21  pigsty-v1.0.0.tgz
invalid line without proper format
e62f9ce9f89a58958609da7b234bf2f2  pigsty-v3.1.0.tgz
1a79a4d60de6718e8e5b326e338ae533  pigsty-v3.1.0-b1.tgz
b026324c6904b2a9cb4b88d6d61c81d1  pigsty-v1.0.0.tar.gz
";

        let catalog = parse_manifest(content, BASE_URL, "pigsty");

        assert_eq!(
            versions(&catalog),
            vec!["v3.1.0", "v3.1.0-b1", "v1.0.0", "v0.9.0", "v0.8.0"]
        );
    }

    #[test]
    fn parse_manifest_returns_empty_catalog_for_no_valid_lines() {
        let catalog = parse_manifest("nothing to see\n\n", BASE_URL, "pigsty");

        assert!(catalog.is_empty());
    }

    #[test]
    fn latest_stable_skips_prereleases() {
        let catalog = parse_manifest(
            "aa pigsty-v3.2.0-rc1.tgz\nbb pigsty-v3.1.0.tgz\ncc pigsty-v3.0.0.tgz",
            BASE_URL,
            "pigsty",
        );

        assert_eq!(catalog.latest_stable().unwrap().version(), "v3.1.0");
    }

    #[test]
    fn latest_stable_returns_none_when_only_prereleases() {
        let catalog = parse_manifest("aa pigsty-v3.2.0-rc1.tgz", BASE_URL, "pigsty");

        assert!(catalog.latest_stable().is_none());
    }

    #[test]
    fn since_keeps_versions_at_or_above_floor() {
        let catalog = parse_manifest(
            "aa pigsty-v2.7.0.tgz\nbb pigsty-v3.0.0.tgz\ncc pigsty-v3.0.0-rc1.tgz\ndd pigsty-v3.1.0.tgz",
            BASE_URL,
            "pigsty",
        );

        let listed: Vec<String> = catalog
            .since("v3.0.0")
            .into_iter()
            .map(|r| r.version().to_string())
            .collect();

        assert_eq!(listed, vec!["v3.1.0", "v3.0.0"]);
    }

    #[test]
    fn complete_uses_catalog_versions() {
        let catalog = parse_manifest(
            "aa pigsty-v1.0.0.tgz\nbb pigsty-v1.5.1.tgz\ncc pigsty-v2.0.0.tgz",
            BASE_URL,
            "pigsty",
        );

        assert_eq!(catalog.complete("v1", "v2.0.0"), "v1.5.1");
        assert_eq!(catalog.complete("v9.9.9", "v2.0.0"), "v9.9.9");
    }

    #[tokio::test]
    async fn fetch_manifest_parses_remote_listing() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/src/checksums")
            .with_status(200)
            .with_body("aa pigsty-v3.0.0.tgz\nbb pigsty-v3.1.0.tgz\n")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let catalog = fetch_manifest(&client, &server.url(), "pigsty")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(versions(&catalog), vec!["v3.1.0", "v3.0.0"]);
        assert_eq!(
            catalog.find("v3.1.0").unwrap().download_url(),
            format!("{}/src/pigsty-v3.1.0.tgz", server.url())
        );
    }

    #[tokio::test]
    async fn fetch_manifest_returns_status_error_for_non_success() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/src/checksums")
            .with_status(404)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let result = fetch_manifest(&client, &server.url(), "pigsty").await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(CatalogError::Status { status: 404, .. })
        ));
    }
}
