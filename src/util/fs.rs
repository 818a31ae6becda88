//! File system primitives for staging and bundle assembly.
//!
//! Provides idempotent create/remove operations, symlink-preserving recursive
//! copies, and a cross-device safe directory move.

use crate::error::{ErrorExt, PackagerError, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates all directories of the given path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory tree", path)
}

/// Removes the directory and its contents if it exists.
///
/// Missing paths are not an error, so callers can clear stale state from a
/// prior interrupted run without checking existence first.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing directory tree", path),
    }
}

/// Removes a path of any kind (file, symlink, or directory tree) if it exists.
pub async fn remove_path(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).fs_context("inspecting path", path),
    };
    if meta.is_dir() {
        remove_dir_all(path).await
    } else {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).fs_context("removing file", path),
        }
    }
}

#[cfg(unix)]
fn symlink_any(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_any(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Creates a symbolic link at `link` pointing to `target`.
pub async fn symlink(target: &Path, link: &Path) -> Result<()> {
    let target = target.to_path_buf();
    let link_path = link.to_path_buf();
    tokio::task::spawn_blocking(move || symlink_any(&target, &link_path))
        .await
        .map_err(|e| PackagerError::Anyhow(anyhow::anyhow!("symlink task panicked: {e}")))?
        .fs_context("creating symlink", link)
}

/// Recursively copies a directory, creating destination ancestors as needed.
///
/// Symlinks are recreated as symlinks rather than followed. An optional filter
/// receives each entry's path relative to `from`; entries where it returns
/// false are pruned (directories are pruned with their contents).
pub async fn copy_dir_filtered(
    from: &Path,
    to: &Path,
    filter: Option<std::sync::Arc<dyn Fn(&Path) -> bool + Send + Sync>>,
) -> Result<()> {
    if !from.is_dir() {
        return Err(PackagerError::Fs {
            op: "copying directory".into(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "source is not a directory"),
        });
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();
    let to_for_task = to.clone();

    // Blocking traversal on the dedicated thread pool
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let to = to_for_task;
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut walker = walkdir::WalkDir::new(&from).follow_links(false).into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry.map_err(io::Error::other)?;
            let rel_path: PathBuf = entry
                .path()
                .strip_prefix(&from)
                .map_err(io::Error::other)?
                .to_path_buf();

            if !rel_path.as_os_str().is_empty() {
                if let Some(keep) = &filter {
                    if !keep(&rel_path) {
                        if entry.file_type().is_dir() {
                            walker.skip_current_dir();
                        }
                        continue;
                    }
                }
            }

            let dest_path = to.join(&rel_path);
            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())?;
                symlink_any(&target, &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path)?;
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| PackagerError::Anyhow(anyhow::anyhow!("directory copy task panicked: {e}")))?
    .fs_context("copying directory", &to)
}

/// Recursively copies a directory without filtering.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    copy_dir_filtered(from, to, None).await
}

/// Moves a directory, falling back to copy-and-remove across filesystems.
///
/// Staging roots usually live under the OS temp dir while output dirs do not,
/// so a plain rename can fail with `EXDEV`.
pub async fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating destination parent", parent)?;
    }
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(cross_device_code()) => {
            copy_dir(from, to).await?;
            remove_dir_all(from).await
        }
        Err(e) => Err(e).fs_context("moving directory", to),
    }
}

#[cfg(unix)]
const fn cross_device_code() -> i32 {
    18 // EXDEV
}

#[cfg(windows)]
const fn cross_device_code() -> i32 {
    17 // ERROR_NOT_SAME_DEVICE
}
