//! Packaging orchestration.
//!
//! The [`Packager`] expands a request into the valid combination list, clears
//! the staging area once, drives each combination's pipeline to completion,
//! and aggregates the results.

use crate::error::{PackagerError, Result};
use crate::extract::{Extractor, ZipExtractor};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::metadata;
use crate::packager::pipeline::{Pipeline, PipelineOutcome};
use crate::packager::probe::{CapabilityProbe, SymlinkProbe};
use crate::packager::request::{Exclusions, PackagingRequest};
use crate::packager::staging::StagingArea;
use crate::packager::targets::Targets;
use crate::packager::validate::validate_selector;
use crate::platform::Builders;
use path_absolutize::Absolutize;
use std::path::PathBuf;
use std::sync::Arc;

/// How per-combination failures affect the whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// First failure aborts the run; remaining combinations are discarded
    #[default]
    FailFast,
    /// Every combination runs; failures are reported together at the end
    BestEffort,
}

/// Packaging orchestrator.
///
/// Holds the immutable target registry and the collaborator set for a
/// process; [`Packager::package`] executes one run.
///
/// # Examples
///
/// ```no_run
/// use shipkit::{Packager, PackagingRequest, Selector};
///
/// # async fn example() -> shipkit::Result<()> {
/// let request = PackagingRequest::builder("./my-app")
///     .name("MyApp")
///     .version("10.0.0")
///     .platform(Selector::list(["linux"]))
///     .arch(Selector::list(["x64"]))
///     .out_dir("./dist")
///     .build();
///
/// let paths = Packager::new(Default::default()).package(request).await?;
/// for path in paths {
///     println!("bundled: {}", path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Packager {
    targets: Targets,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    builders: Builders,
    probe: Option<Arc<dyn CapabilityProbe>>,
    aggregation: Aggregation,
}

impl Packager {
    /// Creates an orchestrator with the default collaborators: HTTPS fetcher,
    /// zip extractor, and the built-in platform builders.
    pub fn new(targets: Targets) -> Self {
        Self {
            targets,
            fetcher: Arc::new(HttpFetcher::new()),
            extractor: Arc::new(ZipExtractor),
            builders: Builders::default(),
            probe: None,
            aggregation: Aggregation::default(),
        }
    }

    /// Replaces the binary-acquisition collaborator.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replaces the archive-extraction collaborator.
    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replaces the platform builder set.
    pub fn builders(mut self, builders: Builders) -> Self {
        self.builders = builders;
        self
    }

    /// Replaces the capability probe.
    ///
    /// By default a [`SymlinkProbe`] anchored at the run's staging root (or
    /// the OS temp dir when staging is disabled) is constructed per run.
    pub fn probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Selects the failure-aggregation mode.
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Packages the application for every valid (platform, architecture)
    /// combination of the request.
    ///
    /// Returns the final bundle paths in combination order, with skipped
    /// combinations omitted. Validation and inference failures abort before
    /// any combination starts; per-combination failures are handled per the
    /// configured [`Aggregation`].
    pub async fn package(&self, mut request: PackagingRequest) -> Result<Vec<PathBuf>> {
        // Selector validation happens before any I/O.
        let archs = validate_selector(
            "arch",
            request.arch.as_ref(),
            self.targets.archs(),
            |a| a.as_str(),
            |name| self.targets.arch_by_name(name),
        )?;
        let platforms = validate_selector(
            "platform",
            request.platform.as_ref(),
            self.targets.platforms(),
            |p| p.as_str(),
            |name| self.targets.platform_by_name(name),
        )?;

        metadata::resolve_metadata(&mut request).await?;
        let name = request.name.clone().ok_or_else(|| PackagerError::Inference {
            reason: "application name is not set after metadata resolution".into(),
        })?;
        let version = request.version.clone().ok_or_else(|| PackagerError::Inference {
            reason: "unable to determine the runtime version; specify it explicitly or \
                     declare an \"electron\" dependency in the package descriptor"
                .into(),
        })?;

        let exclusions = Exclusions::compile(&request.exclusions, &self.nested_out_pattern(&request))?;

        let combinations = Targets::combinations(&archs, &platforms, &version);
        log::info!(
            "packaging \"{name}\" v{version}: {} combination(s)",
            combinations.len()
        );

        // Clearing the staging root is a barrier: no pipeline starts until
        // stale state from prior runs is gone.
        let staging = StagingArea::from_request(&request.staging);
        staging.clear().await?;

        let default_probe;
        let probe: &dyn CapabilityProbe = match &self.probe {
            Some(probe) => &**probe,
            None => {
                let base = staging
                    .root()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(std::env::temp_dir);
                default_probe = SymlinkProbe::new(base);
                &default_probe
            }
        };

        let pipeline = Pipeline {
            fetcher: &*self.fetcher,
            extractor: &*self.extractor,
            builders: &self.builders,
            staging: &staging,
            probe,
            request: &request,
        };

        let mut built = Vec::new();
        let mut failures = Vec::new();
        let mut symlink_ok = None;

        for combination in &combinations {
            let opts = crate::packager::request::CombinationOptions {
                name: name.clone(),
                version: version.clone(),
                platform: combination.platform,
                arch: combination.arch,
                out_dir: request.out_dir.clone(),
                source_dir: request.source_dir.clone(),
                exclusions: exclusions.clone(),
            };

            match pipeline.run(combination, &opts, &mut symlink_ok).await {
                Ok(PipelineOutcome::Built(path)) => built.push(path),
                Ok(PipelineOutcome::Skipped(reason)) => {
                    log::debug!("{} skipped: {reason:?}", combination.dir_name());
                }
                Err(e) => match self.aggregation {
                    Aggregation::FailFast => return Err(e),
                    Aggregation::BestEffort => {
                        log::error!("{} failed: {e}", combination.dir_name());
                        failures.push(e);
                    }
                },
            }
        }

        if failures.is_empty() {
            Ok(built)
        } else {
            Err(PackagerError::Partial { built, failures })
        }
    }

    /// When the output directory nests inside the source tree, the app-source
    /// copy must not recurse into already-produced bundles.
    fn nested_out_pattern(&self, request: &PackagingRequest) -> Vec<String> {
        let source = match request.source_dir.absolutize() {
            Ok(p) => p.into_owned(),
            Err(_) => return Vec::new(),
        };
        let out = match request.out_dir.absolutize() {
            Ok(p) => p.into_owned(),
            Err(_) => return Vec::new(),
        };
        match out.strip_prefix(&source) {
            Ok(rel) if !rel.as_os_str().is_empty() => {
                let escaped = regex::escape(&rel.to_string_lossy().replace('\\', "/"));
                vec![format!("^/{escaped}($|/)")]
            }
            _ => Vec::new(),
        }
    }
}
