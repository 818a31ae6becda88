//! macOS bundle builder, shared by the darwin and mas platforms.

use super::{PlatformBuilder, build_error, deliver, stage_app_source};
use crate::error::Result;
use crate::packager::request::CombinationOptions;
use crate::util::fs;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Runtime `.app` directory name inside extracted mac-family archives.
const RUNTIME_APP_DIR: &str = "Electron.app";

/// Builds the macOS `.app` bundle: renames the runtime's app directory to the
/// app name and places the app source under `Contents/Resources/app`.
///
/// The extracted runtime links framework versions with symlinks, which is why
/// the orchestrator gates mac-family combinations on the symlink probe.
#[derive(Clone, Copy, Debug, Default)]
pub struct DarwinBuilder;

#[async_trait]
impl PlatformBuilder for DarwinBuilder {
    async fn build(&self, opts: &CombinationOptions, staging_dir: &Path) -> Result<PathBuf> {
        log::info!("building {} bundle for {}", opts.platform, opts.name);

        let app_dir = staging_dir.join(format!("{}.app", opts.name));
        let runtime_app = staging_dir.join(RUNTIME_APP_DIR);
        if runtime_app.is_dir() {
            tokio::fs::rename(&runtime_app, &app_dir)
                .await
                .map_err(|e| build_error(opts.platform, e))?;
        } else {
            // Mock staging trees carry no runtime app; lay out the skeleton
            fs::create_dir_all(&app_dir.join("Contents"), false)
                .await
                .map_err(|e| build_error(opts.platform, e))?;
        }

        stage_app_source(opts, &app_dir.join("Contents").join("Resources"))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::tests::options;
    use crate::packager::targets::Platform;

    #[tokio::test]
    async fn renames_runtime_app_and_stages_source() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("project");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("main.js"), b"app").unwrap();

        let staging = tmp.path().join("staging/darwin-x64");
        std::fs::create_dir_all(staging.join("Electron.app/Contents/Resources")).unwrap();
        std::fs::write(
            staging.join("Electron.app/Contents/Resources/default_app.asar"),
            b"placeholder",
        )
        .unwrap();

        let out = tmp.path().join("out");
        let opts = options(Platform::Darwin, &source, &out);

        let final_path = DarwinBuilder.build(&opts, &staging).await.unwrap();

        assert_eq!(final_path, out.join("App-darwin-x64"));
        let resources = final_path.join("App.app/Contents/Resources");
        assert!(resources.join("app/main.js").is_file());
        assert!(!resources.join("default_app.asar").exists());
        assert!(!final_path.join("Electron.app").exists());
    }

    #[tokio::test]
    async fn mas_variant_uses_same_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("project");
        std::fs::create_dir_all(&source).unwrap();

        let staging = tmp.path().join("staging/mas-x64");
        std::fs::create_dir_all(&staging).unwrap();

        let out = tmp.path().join("out");
        let opts = options(Platform::Mas, &source, &out);

        let final_path = DarwinBuilder.build(&opts, &staging).await.unwrap();
        assert_eq!(final_path, out.join("App-mas-x64"));
        assert!(final_path.join("App.app/Contents/Resources/app").is_dir());
    }
}
