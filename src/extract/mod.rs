//! Runtime archive extraction.
//!
//! The pipeline only sees the [`Extractor`] boundary; the default
//! implementation unpacks zip archives on the blocking thread pool,
//! preserving unix permissions and symlink entries (the mac-family archive
//! layout depends on them).

use crate::error::{PackagerError, Result};
use async_trait::async_trait;
use std::io::Read;
use std::path::Path;

/// Unpacks an acquired archive into a destination directory.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extracts `archive` into `dest`, creating it as needed.
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Default zip extractor.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipExtractor;

/// File-type bits of a unix mode.
const S_IFMT: u32 = 0o170000;
/// Symlink file type.
const S_IFLNK: u32 = 0o120000;

#[async_trait]
impl Extractor for ZipExtractor {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let archive_path = archive.to_path_buf();
        let dest = dest.to_path_buf();

        log::debug!("extracting {} into {}", archive_path.display(), dest.display());

        let task_archive = archive_path.clone();
        tokio::task::spawn_blocking(move || extract_zip(&task_archive, &dest))
            .await
            .map_err(|e| PackagerError::Extraction {
                archive: archive_path.clone(),
                reason: format!("extraction task panicked: {e}"),
            })?
            .map_err(|reason| PackagerError::Extraction {
                archive: archive_path,
                reason,
            })
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> std::result::Result<(), String> {
    let file =
        std::fs::File::open(archive).map_err(|e| format!("cannot open archive: {e}"))?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| format!("not a readable zip archive: {e}"))?;

    std::fs::create_dir_all(dest).map_err(|e| format!("cannot create destination: {e}"))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| format!("cannot read entry #{index}: {e}"))?;

        // Entries escaping the destination are dropped, not an error
        let Some(rel) = entry.enclosed_name() else {
            log::warn!("skipping unsafe archive entry {:?}", entry.name());
            continue;
        };
        let out_path = dest.join(rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| format!("cannot create {}: {e}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
        }

        let mode = entry.unix_mode();

        #[cfg(unix)]
        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let mut target = String::new();
            entry
                .read_to_string(&mut target)
                .map_err(|e| format!("cannot read symlink entry: {e}"))?;
            std::os::unix::fs::symlink(&target, &out_path)
                .map_err(|e| format!("cannot create symlink {}: {e}", out_path.display()))?;
            continue;
        }

        let mut out = std::fs::File::create(&out_path)
            .map_err(|e| format!("cannot create {}: {e}", out_path.display()))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| format!("cannot write {}: {e}", out_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o777))
                .map_err(|e| format!("cannot set permissions on {}: {e}", out_path.display()))?;
        }
    }

    Ok(())
}

/// Mock-friendly helper for building zip fixtures in tests.
#[cfg(test)]
pub(crate) fn write_test_zip(path: &Path, files: &[(&str, &[u8])]) {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, contents) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
}
