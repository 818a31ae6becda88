//! Host capability probing.
//!
//! The mac-family bundle layout links framework versions, so packaging those
//! platforms requires a filesystem that can create symbolic links. The probe
//! answers that question empirically rather than guessing from the OS.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Answers whether the host can support a capability one or more platforms
/// depend on.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Whether the capability is available on this host.
    async fn supported(&self) -> bool;
}

/// Probes whether the host filesystem supports creating symbolic links.
#[derive(Clone, Debug)]
pub struct SymlinkProbe {
    base: PathBuf,
}

impl SymlinkProbe {
    /// Creates a probe that works inside the given temp base directory.
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    async fn attempt(&self, dir: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        let target = dir.join("probe-target");
        tokio::fs::write(&target, b"probe").await?;

        let link = dir.join("probe-link");
        #[cfg(unix)]
        tokio::fs::symlink(&target, &link).await?;
        #[cfg(windows)]
        tokio::fs::symlink_file(&target, &link).await?;

        // The link must actually resolve, not merely exist
        tokio::fs::symlink_metadata(&link).await?;
        Ok(())
    }
}

#[async_trait]
impl CapabilityProbe for SymlinkProbe {
    /// Runs the probe: creates a throwaway directory, writes a file, attempts
    /// a symlink to it, and reports whether the link was created.
    ///
    /// The throwaway directory is removed regardless of outcome; cleanup
    /// failures are swallowed so they never mask the probe result.
    async fn supported(&self) -> bool {
        let dir = self
            .base
            .join(format!("symlink-probe-{}", std::process::id()));

        let outcome = self.attempt(&dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            log::debug!("symlink probe cleanup failed (ignored): {e}");
        }

        match outcome {
            Ok(()) => true,
            Err(e) => {
                log::debug!("symlink probe failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_succeeds_on_unix_tempfs_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let probe = SymlinkProbe::new(tmp.path());
        assert!(probe.supported().await);

        // Throwaway directory must be gone afterwards
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn probe_fails_when_base_is_not_writable() {
        // A base path that cannot be created (a file stands in the way)
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let probe = SymlinkProbe::new(blocker.join("nested"));
        assert!(!probe.supported().await);
    }
}
