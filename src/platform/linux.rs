//! Linux bundle builder.

use super::{PlatformBuilder, build_error, deliver, rename_executable, stage_app_source};
use crate::error::Result;
use crate::packager::request::CombinationOptions;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Builds the Linux directory bundle: the extracted runtime with the app
/// source under `resources/app` and the executable renamed to the app name.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinuxBuilder;

#[async_trait]
impl PlatformBuilder for LinuxBuilder {
    async fn build(&self, opts: &CombinationOptions, staging_dir: &Path) -> Result<PathBuf> {
        log::info!("building {} bundle for {}", opts.platform, opts.name);

        rename_executable(staging_dir, "electron", &opts.name)
            .await
            .map_err(|e| build_error(opts.platform, e))?;

        stage_app_source(opts, &staging_dir.join("resources"))
            .await
            .map_err(|e| build_error(opts.platform, e))?;

        let final_path = opts.final_path();
        deliver(staging_dir, &final_path)
            .await
            .map_err(|e| build_error(opts.platform, e))?;

        log::info!("created bundle at {}", final_path.display());
        Ok(final_path)
    }
}
