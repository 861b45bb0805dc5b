//! Distribution download with streaming checksum verification

use crate::error::{BuildpackError, BuildpackResult};
use crate::resolve::Dependency;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 64 * 1024;

/// HTTP fetcher for catalog distributions
#[derive(Clone)]
pub struct Downloader {
    agent: ureq::Agent,
    timeout: Duration,
}

impl Downloader {
    /// Create a downloader whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent, timeout }
    }

    /// Download a dependency to `dest` and verify its checksum.
    ///
    /// Returns the hex SHA-256 of the bytes written. A partial or
    /// mismatching file is removed before the error is returned.
    pub async fn fetch(&self, dep: &Dependency, dest: &Path) -> BuildpackResult<String> {
        let downloader = self.clone();
        let url = dep.uri.clone();
        let expected = dep.sha256.clone();
        let target = dest.to_path_buf();

        let task = tokio::task::spawn_blocking(move || {
            downloader.fetch_blocking(&url, &target, expected.as_deref())
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(BuildpackError::Internal(format!("download task failed: {}", e))),
            Err(_) => {
                let _ = tokio::fs::remove_file(dest).await;
                Err(BuildpackError::Transport {
                    url: dep.uri.clone(),
                    reason: format!("timed out after {}s", self.timeout.as_secs()),
                })
            }
        }
    }

    /// Blocking form of [`Downloader::fetch`]
    pub fn fetch_blocking(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
    ) -> BuildpackResult<String> {
        let digest = match self.stream_to_file(url, dest) {
            Ok(digest) => digest,
            Err(e) => {
                let _ = std::fs::remove_file(dest);
                return Err(e);
            }
        };

        match expected_sha256 {
            Some(expected) => {
                if let Err(e) = verify_checksum(url, expected, &digest) {
                    let _ = std::fs::remove_file(dest);
                    return Err(e);
                }
            }
            None => warn!("No checksum published for {}, skipping verification", url),
        }

        Ok(digest)
    }

    fn stream_to_file(&self, url: &str, dest: &Path) -> BuildpackResult<String> {
        debug!("Downloading {} to {}", url, dest.display());

        let mut response = self.agent.get(url).call().map_err(|e| transport(url, e))?;
        let mut reader = response.body_mut().as_reader();

        let mut file = File::create(dest).map_err(|e| BuildpackError::write(dest, e))?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0usize;

        loop {
            let n = reader.read(&mut buf).map_err(|e| transport(url, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n])
                .map_err(|e| BuildpackError::write(dest, e))?;
            total += n;
        }

        file.sync_all().map_err(|e| BuildpackError::write(dest, e))?;
        debug!("Downloaded {} bytes from {}", total, url);

        Ok(hex::encode(hasher.finalize()))
    }
}

/// Compare a computed digest against the published one (case-insensitive hex)
pub fn verify_checksum(url: &str, expected: &str, actual: &str) -> BuildpackResult<()> {
    if expected.trim().eq_ignore_ascii_case(actual) {
        Ok(())
    } else {
        Err(BuildpackError::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.trim().to_lowercase(),
            actual: actual.to_string(),
        })
    }
}

/// Where a dependency is staged inside the destination directory
pub fn staging_path(dest_dir: &Path, dep: &Dependency) -> PathBuf {
    dest_dir.join(".download").join(dep.file_name())
}

fn transport(url: &str, err: impl std::fmt::Display) -> BuildpackError {
    BuildpackError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
