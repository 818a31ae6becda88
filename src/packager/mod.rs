//! The packaging orchestrator and its supporting components.
//!
//! # Overview
//!
//! A run:
//! 1. Validates the request's selectors against the target registry
//! 2. Resolves missing metadata from the package descriptor
//! 3. Expands the request into the valid (platform, architecture) list
//! 4. Clears the staging area once
//! 5. Drives one pipeline per combination, in enumeration order
//! 6. Aggregates results per the configured failure policy
//!
//! # Module Organization
//!
//! - [`targets`] - supported platforms/architectures and combination expansion
//! - [`validate`] - selector normalization
//! - [`request`] - request configuration and per-combination option views
//! - [`staging`] - staging-area lifecycle
//! - [`probe`] - host capability probing
//! - [`pipeline`] - the per-combination stage sequence
//! - [`orchestrator`] - the [`Packager`] entry point

pub mod orchestrator;
pub mod pipeline;
pub mod probe;
pub mod request;
pub mod staging;
pub mod targets;
pub mod validate;

pub use orchestrator::{Aggregation, Packager};
pub use pipeline::{PipelineOutcome, SkipReason};
pub use probe::{CapabilityProbe, SymlinkProbe};
pub use request::{
    CombinationOptions, ExclusionRules, Exclusions, PackagingRequest, PostExtractHook,
    RequestBuilder, Staging,
};
pub use staging::StagingArea;
pub use targets::{Arch, Combination, Platform, Targets};
pub use validate::Selector;
