//! Platform-specific bundle construction.
//!
//! Each supported platform has a builder behind the [`PlatformBuilder`]
//! boundary; [`Builders`] selects one with an exhaustive match on the
//! platform identifier. The default builders produce the minimal
//! `<name>-<platform>-<arch>` directory layout: runtime files from the
//! staging directory, the app source copied into the runtime's resources
//! location, and the runtime executable renamed to the app name.

pub mod darwin;
pub mod linux;
pub mod win32;

use crate::error::{PackagerError, Result};
use crate::packager::request::CombinationOptions;
use crate::packager::targets::Platform;
use crate::util::fs;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use darwin::DarwinBuilder;
pub use linux::LinuxBuilder;
pub use win32::Win32Builder;

/// Produces the final, platform-specific bundle layout for one combination.
#[async_trait]
pub trait PlatformBuilder: Send + Sync {
    /// Transforms the staging directory into the final bundle and returns its
    /// path.
    async fn build(&self, opts: &CombinationOptions, staging_dir: &Path) -> Result<PathBuf>;
}

/// The builder set for one run, one per supported platform.
#[derive(Clone)]
pub struct Builders {
    darwin: Arc<dyn PlatformBuilder>,
    linux: Arc<dyn PlatformBuilder>,
    mas: Arc<dyn PlatformBuilder>,
    win32: Arc<dyn PlatformBuilder>,
}

impl Default for Builders {
    fn default() -> Self {
        let darwin = Arc::new(DarwinBuilder);
        Self {
            darwin: darwin.clone(),
            linux: Arc::new(LinuxBuilder),
            // The App Store variant shares the macOS layout
            mas: darwin,
            win32: Arc::new(Win32Builder),
        }
    }
}

impl Builders {
    /// Uses one builder for every platform. Intended for tests and embedders
    /// that bring their own bundle format.
    pub fn uniform(builder: Arc<dyn PlatformBuilder>) -> Self {
        Self {
            darwin: builder.clone(),
            linux: builder.clone(),
            mas: builder.clone(),
            win32: builder,
        }
    }

    /// Selects the builder for a platform.
    pub fn for_platform(&self, platform: Platform) -> &Arc<dyn PlatformBuilder> {
        match platform {
            Platform::Darwin => &self.darwin,
            Platform::Linux => &self.linux,
            Platform::Mas => &self.mas,
            Platform::Win32 => &self.win32,
        }
    }
}

/// Wraps an error into [`PackagerError::Build`] for the given platform.
pub(crate) fn build_error(platform: Platform, reason: impl std::fmt::Display) -> PackagerError {
    PackagerError::Build {
        platform: platform.to_string(),
        reason: reason.to_string(),
    }
}

/// Copies the app source into the bundle's resources location, honoring the
/// run's exclusion rules, and drops the runtime's placeholder app.
pub(crate) async fn stage_app_source(
    opts: &CombinationOptions,
    resources_dir: &Path,
) -> Result<()> {
    for placeholder in ["default_app", "default_app.asar"] {
        fs::remove_path(&resources_dir.join(placeholder)).await?;
    }
    fs::copy_dir_filtered(
        &opts.source_dir,
        &resources_dir.join("app"),
        Some(opts.exclusions.keep_filter()),
    )
    .await
}

/// Renames the runtime executable to the app name, when present.
///
/// Mock staging trees in tests may not carry an executable; that is not an
/// error, the rename is simply skipped.
pub(crate) async fn rename_executable(
    work_dir: &Path,
    runtime_name: &str,
    app_name: &str,
) -> Result<()> {
    let from = work_dir.join(runtime_name);
    if !from.exists() {
        log::debug!("no runtime executable at {}, skipping rename", from.display());
        return Ok(());
    }
    let to = work_dir.join(app_name);
    tokio::fs::rename(&from, &to)
        .await
        .map_err(|e| PackagerError::Fs {
            op: "renaming runtime executable".into(),
            path: to.clone(),
            source: e,
        })
}

/// Moves the finished bundle from the staging directory to its final path.
/// No-op when staging is disabled and the two are the same directory.
pub(crate) async fn deliver(work_dir: &Path, final_path: &Path) -> Result<()> {
    if work_dir == final_path {
        return Ok(());
    }
    fs::move_dir(work_dir, final_path).await
}
