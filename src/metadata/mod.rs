//! Application metadata resolution from the project's package descriptor.
//!
//! Fills in a request's missing name and runtime version by reading the
//! project's `package.json`. When both are already supplied nothing is read.

use crate::error::{PackagerError, Result};
use crate::packager::request::PackagingRequest;
use path_absolutize::Absolutize;
use std::collections::HashMap;
use std::path::Path;

/// Runtime package names recognized in dependency declarations: the current
/// name and the legacy prebuilt name.
pub const RUNTIME_PACKAGES: &[&str] = &["electron", "electron-prebuilt"];

/// Parsed package descriptor (`package.json`).
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Descriptor {
    /// Package name
    pub name: Option<String>,
    /// Human-facing product name, preferred over `name` when present
    pub product_name: Option<String>,
    /// Package version (used when reading an installed dependency's descriptor)
    pub version: Option<String>,
    /// Direct dependency declarations
    pub dependencies: HashMap<String, String>,
    /// Development dependency declarations
    pub dev_dependencies: HashMap<String, String>,
}

/// Reads and parses the package descriptor in the given project directory.
pub async fn read_descriptor(project_dir: &Path) -> Result<Descriptor> {
    let descriptor_path = project_dir.join("package.json");
    let bytes = tokio::fs::read(&descriptor_path)
        .await
        .map_err(|e| PackagerError::Inference {
            reason: format!(
                "unable to read {}: {e}; is \"{}\" an application project directory?",
                descriptor_path.display(),
                project_dir.display()
            ),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| PackagerError::Inference {
        reason: format!("unable to parse {}: {e}", descriptor_path.display()),
    })
}

/// Resolves the installed version of a dependency by reading its own
/// descriptor under the project's `node_modules`.
///
/// Failure here is a hard error: a declared dependency whose installed
/// version cannot be read means the project is not in a packageable state.
pub async fn resolve_installed_version(package: &str, base_dir: &Path) -> Result<String> {
    let installed_dir = base_dir.join("node_modules").join(package);
    let descriptor = read_descriptor(&installed_dir).await.map_err(|e| {
        PackagerError::Inference {
            reason: format!(
                "dependency \"{package}\" is declared but its installed version could not be \
                 resolved ({e}); run your package install step first"
            ),
        }
    })?;
    descriptor.version.ok_or_else(|| PackagerError::Inference {
        reason: format!(
            "installed package \"{package}\" has no version field in its descriptor"
        ),
    })
}

/// Ensures the request's `name` and `version` are set.
///
/// If both are already provided this performs no I/O. Otherwise the project
/// descriptor is loaded: the name comes from `productName` falling back to
/// `name`; the version from a runtime dependency declaration ([`RUNTIME_PACKAGES`])
/// in `dependencies` or `devDependencies`. A declared requirement that is not
/// an exact version is resolved against the installed package. If no runtime
/// dependency is declared at all, `version` is left unset for the caller to
/// surface.
///
/// A relative project directory is rewritten to an absolute path anchored at
/// the process working directory first, so descriptor lookup does not depend
/// on the orchestrator's own working directory.
pub async fn resolve_metadata(request: &mut PackagingRequest) -> Result<()> {
    if request.name.is_some() && request.version.is_some() {
        return Ok(());
    }

    if request.source_dir.is_relative() {
        let absolute = request
            .source_dir
            .absolutize()
            .map_err(PackagerError::Io)?
            .into_owned();
        request.source_dir = absolute;
    }

    let descriptor = read_descriptor(&request.source_dir).await?;

    if request.name.is_none() {
        request.name = descriptor.product_name.clone().or(descriptor.name.clone());
        if request.name.is_none() {
            return Err(PackagerError::Inference {
                reason: format!(
                    "package descriptor in {} has neither \"productName\" nor \"name\"; \
                     supply an application name explicitly",
                    request.source_dir.display()
                ),
            });
        }
    }

    if request.version.is_none() {
        request.version = infer_runtime_version(&descriptor, &request.source_dir).await?;
    }

    Ok(())
}

/// Infers the runtime version from the descriptor's dependency declarations.
async fn infer_runtime_version(
    descriptor: &Descriptor,
    project_dir: &Path,
) -> Result<Option<String>> {
    for package in RUNTIME_PACKAGES {
        let declared = descriptor
            .dependencies
            .get(*package)
            .or_else(|| descriptor.dev_dependencies.get(*package));
        let Some(declared) = declared else { continue };

        // An exact version declaration is used as-is; a range requires the
        // installed package to know what actually resolved.
        if semver::Version::parse(declared).is_ok() {
            log::debug!("runtime version {declared} declared by \"{package}\"");
            return Ok(Some(declared.clone()));
        }

        let installed = resolve_installed_version(package, project_dir).await?;
        log::debug!("runtime version {installed} resolved from installed \"{package}\"");
        return Ok(Some(installed));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::request::PackagingRequest;

    fn write_descriptor(dir: &Path, json: &str) {
        std::fs::write(dir.join("package.json"), json).unwrap();
    }

    #[tokio::test]
    async fn presupplied_name_and_version_read_nothing() {
        // A directory that does not exist: any I/O would fail
        let mut request = PackagingRequest::builder("/definitely/not/a/project")
            .name("App")
            .version("10.0.0")
            .build();
        resolve_metadata(&mut request).await.unwrap();
        assert_eq!(request.name.as_deref(), Some("App"));
        assert_eq!(request.version.as_deref(), Some("10.0.0"));
    }

    #[tokio::test]
    async fn product_name_wins_over_name() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(
            tmp.path(),
            r#"{"name": "my-app", "productName": "My App",
                "devDependencies": {"electron": "9.0.0"}}"#,
        );
        let mut request = PackagingRequest::builder(tmp.path()).build();
        resolve_metadata(&mut request).await.unwrap();
        assert_eq!(request.name.as_deref(), Some("My App"));
        assert_eq!(request.version.as_deref(), Some("9.0.0"));
    }

    #[tokio::test]
    async fn name_field_is_the_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(tmp.path(), r#"{"name": "my-app"}"#);
        let mut request = PackagingRequest::builder(tmp.path()).version("1.0.0").build();
        resolve_metadata(&mut request).await.unwrap();
        assert_eq!(request.name.as_deref(), Some("my-app"));
    }

    #[tokio::test]
    async fn prebuilt_package_name_is_recognized() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(
            tmp.path(),
            r#"{"name": "legacy", "dependencies": {"electron-prebuilt": "1.8.8"}}"#,
        );
        let mut request = PackagingRequest::builder(tmp.path()).build();
        resolve_metadata(&mut request).await.unwrap();
        assert_eq!(request.version.as_deref(), Some("1.8.8"));
    }

    #[tokio::test]
    async fn range_declaration_resolves_installed_version() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(
            tmp.path(),
            r#"{"name": "app", "devDependencies": {"electron": "^9.0.0"}}"#,
        );
        let installed = tmp.path().join("node_modules/electron");
        std::fs::create_dir_all(&installed).unwrap();
        write_descriptor(&installed, r#"{"name": "electron", "version": "9.4.1"}"#);

        let mut request = PackagingRequest::builder(tmp.path()).build();
        resolve_metadata(&mut request).await.unwrap();
        assert_eq!(request.version.as_deref(), Some("9.4.1"));
    }

    #[tokio::test]
    async fn unresolvable_installed_version_is_a_hard_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(
            tmp.path(),
            r#"{"name": "app", "devDependencies": {"electron": "^9.0.0"}}"#,
        );
        // No node_modules at all
        let mut request = PackagingRequest::builder(tmp.path()).build();
        let err = resolve_metadata(&mut request).await.unwrap_err();
        assert!(err.to_string().contains("electron"));
        assert!(err.to_string().contains("install"));
    }

    #[tokio::test]
    async fn missing_runtime_dependency_leaves_version_unset() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(tmp.path(), r#"{"name": "app", "dependencies": {"react": "17.0.0"}}"#);
        let mut request = PackagingRequest::builder(tmp.path()).build();
        resolve_metadata(&mut request).await.unwrap();
        assert!(request.version.is_none());
    }

    #[tokio::test]
    async fn missing_descriptor_is_an_inference_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut request = PackagingRequest::builder(tmp.path()).build();
        let err = resolve_metadata(&mut request).await.unwrap_err();
        assert!(matches!(err, PackagerError::Inference { .. }));
    }

    #[tokio::test]
    async fn nameless_descriptor_is_an_inference_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(tmp.path(), r#"{"dependencies": {"electron": "9.0.0"}}"#);
        let mut request = PackagingRequest::builder(tmp.path()).build();
        let err = resolve_metadata(&mut request).await.unwrap_err();
        assert!(err.to_string().contains("productName"));
    }
}
