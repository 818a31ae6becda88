//! Error types for packaging operations.
//!
//! Each pipeline stage has its own error variant so failures surface with the
//! combination and stage that produced them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packaging operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Main error type for all packaging operations
#[derive(Error, Debug)]
pub enum PackagerError {
    /// Bad architecture or platform selector, reported before any I/O
    #[error("Validation error: {reason}")]
    Validation {
        /// Reason for the error
        reason: String,
    },

    /// Application name or runtime version could not be determined
    #[error("Inference error: {reason}")]
    Inference {
        /// Reason, including what the user can do about it
        reason: String,
    },

    /// Runtime archive acquisition failed for one combination
    #[error("Failed to acquire runtime v{version} for {platform}-{arch}: {reason}")]
    Acquisition {
        /// Platform name of the failed combination
        platform: String,
        /// Architecture name of the failed combination
        arch: String,
        /// Requested runtime version
        version: String,
        /// Reason for the error
        reason: String,
    },

    /// Archive extraction failed for one combination
    #[error("Failed to extract {archive}: {reason}")]
    Extraction {
        /// Archive being unpacked
        archive: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// A post-extract hook aborted its combination
    #[error("Post-extract hook #{index} failed for {platform}-{arch}: {reason}")]
    Hook {
        /// Zero-based position of the hook in the request's hook list
        index: usize,
        /// Platform name of the failed combination
        platform: String,
        /// Architecture name of the failed combination
        arch: String,
        /// Reason for the error
        reason: String,
    },

    /// Platform-specific bundle construction failed
    #[error("Failed to build {platform} bundle: {reason}")]
    Build {
        /// Platform whose builder failed
        platform: String,
        /// Reason for the error
        reason: String,
    },

    /// Staging or output filesystem operation failed
    #[error("Filesystem error while {op} at {path}: {source}")]
    Fs {
        /// Operation being attempted
        op: String,
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Best-effort aggregation found one or more failed combinations
    #[error("{} of {} combinations failed:\n{}", .failures.len(), .failures.len() + .built.len(), format_failures(.failures))]
    Partial {
        /// Final paths of the combinations that did build
        built: Vec<PathBuf>,
        /// Errors from the combinations that failed
        failures: Vec<PackagerError>,
    },

    /// IO errors without a more specific stage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Package descriptor parse errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

fn format_failures(failures: &[PackagerError]) -> String {
    failures
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extension trait attaching path context to IO results.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`PackagerError::Fs`] with the operation and path.
    fn fs_context(self, op: &str, path: &std::path::Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, op: &str, path: &std::path::Path) -> Result<T> {
        self.map_err(|source| PackagerError::Fs {
            op: op.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_error_lists_every_failure() {
        let err = PackagerError::Partial {
            built: vec![PathBuf::from("/out/App-linux-x64")],
            failures: vec![
                PackagerError::Build {
                    platform: "win32".into(),
                    reason: "missing binary".into(),
                },
                PackagerError::Extraction {
                    archive: PathBuf::from("/tmp/a.zip"),
                    reason: "truncated".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 of 3 combinations failed"));
        assert!(msg.contains("win32"));
        assert!(msg.contains("a.zip"));
    }

    #[test]
    fn fs_context_carries_path() {
        let io: std::result::Result<(), _> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = io
            .fs_context("removing staging root", std::path::Path::new("/tmp/x"))
            .unwrap_err();
        assert!(err.to_string().contains("removing staging root"));
        assert!(err.to_string().contains("/tmp/x"));
    }
}
