//! Staging area lifecycle.
//!
//! One staging root is shared by all combinations of a run; each combination
//! extracts into its own subdirectory. The orchestrator owns the root for the
//! run's duration and clears it once before any pipeline starts.

use crate::error::Result;
use crate::packager::request::Staging;
use crate::packager::targets::Combination;
use crate::util::fs;
use std::path::{Path, PathBuf};

/// Directory under the OS temp dir used when no staging override is given.
const DEFAULT_STAGING_SUBDIR: &str = "shipkit";

/// Manages the temporary working tree shared by all combinations of one run.
#[derive(Clone, Debug)]
pub struct StagingArea {
    root: Option<PathBuf>,
}

impl StagingArea {
    /// Resolves request staging configuration into a staging area.
    pub fn from_request(staging: &Staging) -> Self {
        let root = match staging {
            Staging::Default => Some(std::env::temp_dir().join(DEFAULT_STAGING_SUBDIR)),
            Staging::Dir(dir) => Some(dir.clone()),
            Staging::Disabled => None,
        };
        Self { root }
    }

    /// Whether temp staging is enabled for this run.
    pub fn enabled(&self) -> bool {
        self.root.is_some()
    }

    /// The staging root, when staging is enabled.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Deletes the staging root wholesale, removing stale state from a prior,
    /// possibly interrupted run. No-op when staging is disabled.
    pub async fn clear(&self) -> Result<()> {
        if let Some(root) = &self.root {
            log::debug!("clearing staging root {}", root.display());
            fs::remove_dir_all(root).await?;
        }
        Ok(())
    }

    /// Computes a combination's private working directory.
    ///
    /// With staging enabled this is a deterministic subdirectory of the
    /// staging root; with staging disabled the combination works directly in
    /// its final output path, with no isolation.
    pub fn combination_dir(&self, combination: &Combination, final_path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(combination.dir_name()),
            None => final_path.to_path_buf(),
        }
    }

    /// Creates a combination's working directory, with any missing ancestors,
    /// immediately before extraction.
    pub async fn prepare(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::targets::{Arch, Combination, Platform};

    fn combo() -> Combination {
        Combination {
            platform: Platform::Linux,
            arch: Arch::X64,
            version: "10.0.0".into(),
        }
    }

    #[test]
    fn default_root_lives_under_temp_dir() {
        let area = StagingArea::from_request(&Staging::Default);
        let root = area.root().unwrap();
        assert!(root.starts_with(std::env::temp_dir()));
        assert!(root.ends_with(DEFAULT_STAGING_SUBDIR));
    }

    #[test]
    fn disabled_staging_uses_final_path_directly() {
        let area = StagingArea::from_request(&Staging::Disabled);
        assert!(!area.enabled());
        let final_path = Path::new("/out/App-linux-x64");
        assert_eq!(area.combination_dir(&combo(), final_path), final_path);
    }

    #[test]
    fn combination_dirs_are_deterministic_and_private() {
        let area = StagingArea::from_request(&Staging::Dir(PathBuf::from("/stage")));
        let dir = area.combination_dir(&combo(), Path::new("/out/x"));
        assert_eq!(dir, PathBuf::from("/stage/linux-x64"));
    }

    #[tokio::test]
    async fn clear_removes_stale_state() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("staging");
        std::fs::create_dir_all(root.join("linux-x64")).unwrap();
        std::fs::write(root.join("linux-x64/stale"), b"x").unwrap();

        let area = StagingArea::from_request(&Staging::Dir(root.clone()));
        area.clear().await.unwrap();
        assert!(!root.exists());

        // Clearing a missing root is fine
        area.clear().await.unwrap();
    }
}
