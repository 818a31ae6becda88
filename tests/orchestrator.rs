//! End-to-end packaging runs with the real extractor and platform builders.
//!
//! Only acquisition is mocked: the fetcher serves locally generated zip
//! archives shaped like real runtime releases.

use async_trait::async_trait;
use shipkit::error::Result;
use shipkit::fetch::Fetcher;
use shipkit::packager::{Arch, ExclusionRules, Packager, PackagingRequest, Platform, Selector, Staging, Targets};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

/// Serves a runtime-shaped zip per combination from a local directory.
struct LocalFetcher {
    dir: PathBuf,
    calls: Mutex<Vec<String>>,
}

impl LocalFetcher {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, platform: Platform, arch: Arch, version: &str) -> Result<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{platform}-{arch}-{version}"));

        let archive = self.dir.join(format!("{platform}-{arch}.zip"));
        let file = std::fs::File::create(&archive).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let opts = SimpleFileOptions::default();

        match platform {
            Platform::Linux => {
                writer.start_file("electron", opts).unwrap();
                writer.write_all(b"linux-binary").unwrap();
                writer
                    .start_file("resources/default_app/main.js", opts)
                    .unwrap();
                writer.write_all(b"placeholder").unwrap();
            }
            Platform::Win32 => {
                writer.start_file("electron.exe", opts).unwrap();
                writer.write_all(b"win32-binary").unwrap();
                writer
                    .start_file("resources/default_app.asar", opts)
                    .unwrap();
                writer.write_all(b"placeholder").unwrap();
            }
            Platform::Darwin | Platform::Mas => {
                writer
                    .start_file("Electron.app/Contents/Resources/default_app/main.js", opts)
                    .unwrap();
                writer.write_all(b"placeholder").unwrap();
            }
        }
        writer.finish().unwrap();
        Ok(archive)
    }
}

fn write_project(dir: &Path) {
    std::fs::create_dir_all(dir.join("src")).unwrap();
    std::fs::create_dir_all(dir.join(".git")).unwrap();
    std::fs::write(
        dir.join("package.json"),
        r#"{"name": "demo", "productName": "Demo",
            "devDependencies": {"electron": "10.0.0"}}"#,
    )
    .unwrap();
    std::fs::write(dir.join("src/index.js"), b"console.log('hi')").unwrap();
    std::fs::write(dir.join(".git/HEAD"), b"ref: main").unwrap();
    std::fs::write(dir.join("build.log"), b"noise").unwrap();
}

fn packager(fetcher: Arc<LocalFetcher>) -> Packager {
    Packager::new(Targets::default()).fetcher(fetcher)
}

#[tokio::test]
async fn linux_bundle_has_complete_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    write_project(&project);

    let out = tmp.path().join("dist");
    let request = PackagingRequest::builder(&project)
        .platform(Selector::list(["linux"]))
        .arch(Selector::list(["x64"]))
        .out_dir(&out)
        .staging(Staging::Dir(tmp.path().join("staging")))
        .exclusions(ExclusionRules::Patterns(vec!["\\.log$".into()]))
        .build();

    let fetcher = Arc::new(LocalFetcher::new(tmp.path()));
    let paths = packager(fetcher.clone()).package(request).await.unwrap();

    assert_eq!(paths, vec![out.join("Demo-linux-x64")]);
    let bundle = &paths[0];

    // Runtime executable renamed to the app name
    assert_eq!(std::fs::read(bundle.join("Demo")).unwrap(), b"linux-binary");
    assert!(!bundle.join("electron").exists());

    // App source staged, exclusions honored, placeholder app dropped
    assert!(bundle.join("resources/app/src/index.js").is_file());
    assert!(bundle.join("resources/app/package.json").is_file());
    assert!(!bundle.join("resources/app/.git").exists());
    assert!(!bundle.join("resources/app/build.log").exists());
    assert!(!bundle.join("resources/default_app").exists());

    // Version came from the descriptor
    assert_eq!(fetcher.calls.lock().unwrap().as_slice(), ["linux-x64-10.0.0"]);
}

#[tokio::test]
async fn win32_and_linux_bundles_in_one_run() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    write_project(&project);

    let out = tmp.path().join("dist");
    let request = PackagingRequest::builder(&project)
        .platform(Selector::list(["linux", "win32"]))
        .arch(Selector::list(["ia32", "x64"]))
        .out_dir(&out)
        .staging(Staging::Dir(tmp.path().join("staging")))
        .build();

    let fetcher = Arc::new(LocalFetcher::new(tmp.path()));
    let paths = packager(fetcher).package(request).await.unwrap();

    // Architecture-major, platform-minor ordering
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "Demo-linux-ia32",
            "Demo-win32-ia32",
            "Demo-linux-x64",
            "Demo-win32-x64"
        ]
    );
    assert!(out.join("Demo-win32-x64/Demo.exe").is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn darwin_bundle_renames_app_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    write_project(&project);

    let out = tmp.path().join("dist");
    let request = PackagingRequest::builder(&project)
        .platform(Selector::list(["darwin"]))
        .arch(Selector::list(["arm64"]))
        .out_dir(&out)
        .staging(Staging::Dir(tmp.path().join("staging")))
        .build();

    let fetcher = Arc::new(LocalFetcher::new(tmp.path()));
    let paths = packager(fetcher).package(request).await.unwrap();

    assert_eq!(paths, vec![out.join("Demo-darwin-arm64")]);
    let resources = paths[0].join("Demo.app/Contents/Resources");
    assert!(resources.join("app/src/index.js").is_file());
    assert!(!resources.join("default_app").exists());
}

#[tokio::test]
async fn disabled_staging_builds_in_place() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    write_project(&project);

    let out = tmp.path().join("dist");
    let request = PackagingRequest::builder(&project)
        .platform(Selector::list(["linux"]))
        .arch(Selector::list(["x64"]))
        .out_dir(&out)
        .staging(Staging::Disabled)
        .build();

    let fetcher = Arc::new(LocalFetcher::new(tmp.path()));
    let paths = packager(fetcher).package(request).await.unwrap();

    assert_eq!(paths, vec![out.join("Demo-linux-x64")]);
    assert!(paths[0].join("resources/app/src/index.js").is_file());
    // Nothing was left under the default temp staging location for this run
}

#[tokio::test]
async fn rerun_without_overwrite_skips_and_preserves_bundle() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("project");
    write_project(&project);

    let out = tmp.path().join("dist");
    let build_request = || {
        PackagingRequest::builder(&project)
            .platform(Selector::list(["linux"]))
            .arch(Selector::list(["x64"]))
            .out_dir(&out)
            .staging(Staging::Dir(tmp.path().join("staging")))
            .build()
    };

    let fetcher = Arc::new(LocalFetcher::new(tmp.path()));
    let first = packager(fetcher.clone()).package(build_request()).await.unwrap();
    assert_eq!(first.len(), 1);

    // Mark the bundle so we can tell whether it survived
    std::fs::write(first[0].join("sentinel"), b"v1").unwrap();

    let second = packager(fetcher).package(build_request()).await.unwrap();
    assert!(second.is_empty());
    assert!(first[0].join("sentinel").is_file());
}
