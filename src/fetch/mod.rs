//! Runtime archive acquisition.
//!
//! The orchestrator only sees the [`Fetcher`] boundary; the default
//! implementation downloads official release archives over HTTPS, verifies
//! them against the release's published checksum file, and keeps a local
//! cache so repeated runs do not re-download.

use crate::error::{PackagerError, Result};
use crate::packager::targets::{Arch, Platform};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Acquires the platform/architecture-specific runtime archive.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the local path of the archive for one combination.
    async fn fetch(&self, platform: Platform, arch: Arch, version: &str) -> Result<PathBuf>;
}

/// Default release download base URL.
const DEFAULT_BASE_URL: &str = "https://github.com/electron/electron/releases/download";

/// Name of the per-release checksum manifest.
const CHECKSUM_MANIFEST: &str = "SHASUMS256.txt";

/// HTTPS fetcher with an on-disk cache and SHA-256 verification.
pub struct HttpFetcher {
    base_url: String,
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher using the official release URL and the user cache
    /// directory (falling back to the OS temp dir when none exists).
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("shipkit");
        Self::with_config(DEFAULT_BASE_URL, cache_dir)
    }

    /// Creates a fetcher with an explicit mirror URL and cache directory.
    pub fn with_config<S: Into<String>, P: AsRef<Path>>(base_url: S, cache_dir: P) -> Self {
        Self {
            base_url: base_url.into(),
            cache_dir: cache_dir.as_ref().to_path_buf(),
            client: reqwest::Client::new(),
        }
    }

    fn archive_name(platform: Platform, arch: Arch, version: &str) -> String {
        format!("electron-v{version}-{platform}-{arch}.zip")
    }

    fn acquisition_error(
        platform: Platform,
        arch: Arch,
        version: &str,
        reason: impl std::fmt::Display,
    ) -> PackagerError {
        PackagerError::Acquisition {
            platform: platform.to_string(),
            arch: arch.to_string(),
            version: version.to_string(),
            reason: reason.to_string(),
        }
    }

    async fn download(&self, url: &str) -> std::result::Result<Vec<u8>, String> {
        log::info!("Downloading {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("server returned {}", response.status()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;
        Ok(bytes.to_vec())
    }

    /// Looks up the expected digest for `archive_name` in the release's
    /// checksum manifest and compares it against the downloaded bytes.
    async fn verify(
        &self,
        version: &str,
        archive_name: &str,
        bytes: &[u8],
    ) -> std::result::Result<(), String> {
        let manifest_url = format!("{}/v{version}/{CHECKSUM_MANIFEST}", self.base_url);
        let manifest = self.download(&manifest_url).await?;
        let manifest = String::from_utf8_lossy(&manifest);

        let expected = find_digest(&manifest, archive_name)
            .ok_or_else(|| format!("{archive_name} not listed in {CHECKSUM_MANIFEST}"))?;

        let actual = hex::encode(Sha256::digest(bytes));
        if actual != expected.to_lowercase() {
            return Err(format!(
                "checksum mismatch for {archive_name}: expected {expected}, got {actual}"
            ));
        }
        Ok(())
    }
}

/// Finds the hex digest recorded for `archive_name` in a checksum manifest.
///
/// Manifest lines have the form `<digest> <name>` or `<digest> *<name>`.
fn find_digest(manifest: &str, archive_name: &str) -> Option<String> {
    manifest.lines().find_map(|line| {
        let (digest, name) = line.split_once(char::is_whitespace)?;
        let name = name.trim().trim_start_matches('*');
        (name == archive_name).then(|| digest.to_string())
    })
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, platform: Platform, arch: Arch, version: &str) -> Result<PathBuf> {
        let archive_name = Self::archive_name(platform, arch, version);
        let cached = self.cache_dir.join(format!("v{version}")).join(&archive_name);

        if cached.is_file() {
            log::debug!("using cached archive {}", cached.display());
            return Ok(cached);
        }

        let url = format!("{}/v{version}/{archive_name}", self.base_url);
        let bytes = self
            .download(&url)
            .await
            .map_err(|reason| Self::acquisition_error(platform, arch, version, reason))?;

        self.verify(version, &archive_name, &bytes)
            .await
            .map_err(|reason| Self::acquisition_error(platform, arch, version, reason))?;

        if let Some(parent) = cached.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::acquisition_error(platform, arch, version, e))?;
        }
        tokio::fs::write(&cached, &bytes)
            .await
            .map_err(|e| Self::acquisition_error(platform, arch, version, e))?;

        log::info!("cached runtime archive at {}", cached.display());
        Ok(cached)
    }
}
