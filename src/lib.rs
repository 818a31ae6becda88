//! Packages Electron applications into platform-specific bundles
//!
//! This library turns a packaging request (desired platforms, architectures,
//! app metadata) into one build pipeline per valid (platform, architecture)
//! combination:
//! - Linux, Windows, macOS, and Mac App Store directory bundles
//! - deterministic skip/overwrite handling per combination
//! - pluggable acquisition, extraction, and builder collaborators
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod metadata;
pub mod packager;
pub mod platform;
pub mod util;

// Re-export commonly used types
pub use error::{PackagerError, Result};
pub use packager::{
    Aggregation, Arch, ExclusionRules, Packager, PackagingRequest, Platform, RequestBuilder,
    Selector, Staging, Targets,
};
