//! Checksum-verified artifact downloads
//!
//! The body is streamed into a `.part` file next to the target while the
//! digest is computed over the same bytes in arrival order. The part file is
//! renamed into place only after verification, so a failed transfer never
//! leaves anything at the target path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use md5::{Digest, Md5};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

use crate::release::error::DownloadError;
use crate::release::progress::{PercentTracker, ProgressReporter, mib};
use crate::release::version::ReleaseVersion;

/// Suffix of the in-flight file written during a transfer
const PARTIAL_SUFFIX: &str = ".part";

/// Chunk size used when hashing files already on disk
const HASH_BUFFER_SIZE: usize = 32 * 1024;

/// Result of a successful download call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A satisfying file was already present; nothing was transferred
    AlreadyPresent { path: PathBuf },
    Downloaded {
        path: PathBuf,
        bytes: u64,
        checksum: String,
    },
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DownloadOutcome::AlreadyPresent { path } => path,
            DownloadOutcome::Downloaded { path, .. } => path,
        }
    }
}

pub struct Downloader {
    client: reqwest::Client,
    product: String,
}

impl Downloader {
    /// Creates a downloader for `product` artifacts
    ///
    /// Only connection setup is bounded by `connect_timeout`; transfers
    /// themselves may take as long as they need.
    pub fn new(
        product: &str,
        user_agent: &str,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            product: product.to_string(),
        })
    }

    /// Downloads `release` into `target_dir`
    ///
    /// An empty `target_dir` means the current working directory.
    pub async fn download(
        &self,
        release: &ReleaseVersion,
        target_dir: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> Result<DownloadOutcome, DownloadError> {
        let target_dir = ensure_target_dir(target_dir).await?;
        let filename = release.filename(&self.product);
        let path = target_dir.join(&filename);

        if existing_file_satisfies(&path, release.checksum()).await? {
            return Ok(DownloadOutcome::AlreadyPresent { path });
        }

        info!("Downloading {}", release.download_url());
        let partial = target_dir.join(format!("{}{}", filename, PARTIAL_SUFFIX));
        let transferred = self
            .transfer(release.download_url(), &filename, &partial, progress)
            .await;
        progress.finish();

        let (bytes, checksum) = match transferred {
            Ok(done) => done,
            Err(e) => {
                discard(&partial).await;
                return Err(e);
            }
        };

        if release.is_verifiable() && checksum != release.checksum() {
            warn!("Removing {:?} due to checksum mismatch", partial);
            discard(&partial).await;
            return Err(DownloadError::ChecksumMismatch {
                path,
                expected: release.checksum().to_string(),
                actual: checksum,
            });
        }

        if let Err(e) = fs::rename(&partial, &path).await {
            discard(&partial).await;
            return Err(DownloadError::io(&path, e));
        }

        info!(
            "Downloaded {:?} ({:.1} MiB, {})",
            path,
            mib(bytes),
            checksum
        );
        Ok(DownloadOutcome::Downloaded {
            path,
            bytes,
            checksum,
        })
    }

    async fn transfer(
        &self,
        url: &str,
        filename: &str,
        partial: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(u64, String), DownloadError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::TransferFailed {
                url: url.to_string(),
                reason: format!("status {}", status),
            });
        }

        let total = response.content_length();
        let mut tracker = total.map(PercentTracker::new);
        let mut file = File::create(partial)
            .await
            .map_err(|e| DownloadError::io(partial, e))?;
        let mut hasher = Md5::new();
        let mut bytes = 0u64;

        progress.start(filename, total);
        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(|e| DownloadError::TransferFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            let Some(chunk) = chunk else {
                break;
            };

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(partial, e))?;
            hasher.update(&chunk);
            bytes += chunk.len() as u64;

            if let Some(percent) = tracker.as_mut().and_then(|t| t.record(chunk.len() as u64)) {
                progress.advance(percent);
            }
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::io(partial, e))?;

        Ok((bytes, hex::encode(hasher.finalize())))
    }
}

async fn ensure_target_dir(target_dir: &Path) -> Result<PathBuf, DownloadError> {
    let target_dir = if target_dir.as_os_str().is_empty() {
        std::env::current_dir().map_err(|e| DownloadError::io(target_dir, e))?
    } else {
        target_dir.to_path_buf()
    };

    fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| DownloadError::io(&target_dir, e))?;
    Ok(target_dir)
}

/// Decides whether an existing file can be kept
///
/// Without an expected checksum any existing file is trusted. A file whose
/// digest does not match is removed so the caller fetches it again.
async fn existing_file_satisfies(path: &Path, expected: &str) -> Result<bool, DownloadError> {
    let exists = fs::try_exists(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    if !exists {
        return Ok(false);
    }

    if expected.is_empty() {
        info!("File exists, skipping download: {:?}", path);
        return Ok(true);
    }

    let existing = md5_file(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    if existing == expected {
        info!("File exists with matching checksum, skipping: {:?}", path);
        return Ok(true);
    }

    warn!("Removing existing file with mismatched checksum: {:?}", path);
    fs::remove_file(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    Ok(false)
}

/// Computes the lowercase hex MD5 digest of a file
pub async fn md5_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to remove {:?}: {}", path, e);
    }
}
