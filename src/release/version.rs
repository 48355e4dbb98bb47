//! Release version value type, canonical grammar and artifact filenames
//!
//! Canonical versions look like `v<major>.<minor>.<patch>[-<tier><n>]` where
//! the tier is one of `a`, `b`, `c`, `alpha`, `beta` or `rc`.

use std::sync::LazyLock;

use regex::Regex;

use crate::release::error::VersionError;

/// Extension shared by every published artifact
pub const ARTIFACT_EXTENSION: &str = ".tgz";

/// Path segment under an origin base URL that serves manifests and artifacts
pub const SOURCE_SEGMENT: &str = "src";

static CANONICAL_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+\.\d+\.\d+(?:-(?:a|b|c|alpha|beta|rc)\d+)?$")
        .expect("canonical version pattern is valid")
});

/// One published release artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    version: String,
    checksum: String,
    download_url: String,
}

impl ReleaseVersion {
    /// Creates a release entry, rejecting versions outside the canonical grammar.
    ///
    /// A bare leading digit is accepted and normalized by prefixing `v`.
    pub fn new(
        version: &str,
        checksum: &str,
        download_url: &str,
    ) -> Result<Self, VersionError> {
        let version = parse_canonical(version)?;
        Ok(Self {
            version,
            checksum: checksum.to_ascii_lowercase(),
            download_url: download_url.to_string(),
        })
    }

    /// Creates an uncatalogued entry served from `base_url`.
    ///
    /// The checksum is empty, so downstream verification is skipped.
    pub fn synthetic(version: &str, base_url: &str, product: &str) -> Result<Self, VersionError> {
        let version = parse_canonical(version)?;
        let download_url = artifact_url(base_url, &build_filename(product, &version));
        Ok(Self {
            version,
            checksum: String::new(),
            download_url,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Lowercase hex digest, empty for synthetic entries
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// Returns true if the entry carries a checksum that can be verified
    pub fn is_verifiable(&self) -> bool {
        !self.checksum.is_empty()
    }

    pub fn is_prerelease(&self) -> bool {
        is_prerelease(&self.version)
    }

    /// Artifact filename for this release, e.g. `pigsty-v3.1.0.tgz`
    pub fn filename(&self, product: &str) -> String {
        build_filename(product, &self.version)
    }
}

/// Returns true if `version` matches the canonical grammar exactly
pub fn is_canonical(version: &str) -> bool {
    CANONICAL_VERSION.is_match(version)
}

/// Prefixes `v` when the input starts with a digit
///
/// Examples:
/// - "1.2.3" -> "v1.2.3"
/// - "v1.2.3" -> "v1.2.3"
/// - "latest" -> "latest"
pub fn normalize(version: &str) -> String {
    if version.starts_with(|c: char| c.is_ascii_digit()) {
        format!("v{}", version)
    } else {
        version.to_string()
    }
}

/// Normalizes and validates a version string
pub fn parse_canonical(version: &str) -> Result<String, VersionError> {
    let normalized = normalize(version.trim());
    if is_canonical(&normalized) {
        Ok(normalized)
    } else {
        Err(VersionError::InvalidVersionFormat(version.to_string()))
    }
}

/// Returns true if the version carries a pre-release suffix
pub fn is_prerelease(version: &str) -> bool {
    version.contains('-')
}

/// Builds `<product>-<version>.tgz`
pub fn build_filename(product: &str, version: &str) -> String {
    format!("{}-{}{}", product, version, ARTIFACT_EXTENSION)
}

/// Extracts the canonical version from `<product>-<version>.tgz`
pub fn parse_filename(product: &str, filename: &str) -> Result<String, VersionError> {
    let malformed = || VersionError::MalformedFilename(filename.to_string());

    let version = filename
        .strip_prefix(product)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.strip_suffix(ARTIFACT_EXTENSION))
        .ok_or_else(malformed)?;

    if is_canonical(version) {
        Ok(version.to_string())
    } else {
        Err(malformed())
    }
}

/// Joins an origin base URL with the source segment and a filename
pub fn artifact_url(base_url: &str, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        SOURCE_SEGMENT,
        filename
    )
}
