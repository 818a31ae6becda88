//! Per-combination build pipeline.
//!
//! Each combination runs the same stage sequence:
//! `Pending → Downloading → Extracting → PostHooks → Finalizing → Building`,
//! terminating in `Done`, `Skipped`, or `Failed`. A failure is scoped to its
//! combination; how failures affect the whole run is the orchestrator's
//! aggregation policy, not the pipeline's concern.

use crate::error::{PackagerError, Result};
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::packager::probe::CapabilityProbe;
use crate::packager::request::{CombinationOptions, PackagingRequest};
use crate::packager::staging::StagingArea;
use crate::packager::targets::Combination;
use crate::platform::Builders;
use crate::util::fs;
use std::path::PathBuf;

/// Benign, non-error termination of one combination's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The final output path already exists and overwrite was not requested
    OutputExists,
    /// The host filesystem cannot create the symlinks the bundle needs
    SymlinksUnsupported,
}

/// Terminal result of one combination's pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The bundle was produced at this path
    Built(PathBuf),
    /// The combination was skipped for a benign reason
    Skipped(SkipReason),
}

/// Pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Downloading,
    Extracting,
    PostHooks,
    Finalizing,
    Building,
}

/// Shared collaborators for the pipelines of one run.
pub(crate) struct Pipeline<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub extractor: &'a dyn Extractor,
    pub builders: &'a Builders,
    pub staging: &'a StagingArea,
    pub probe: &'a dyn CapabilityProbe,
    pub request: &'a PackagingRequest,
}

impl Pipeline<'_> {
    /// Runs one combination to its terminal state.
    ///
    /// `symlink_ok` caches the capability probe's answer for the duration of
    /// the run, so sibling mac-family combinations do not re-probe.
    pub async fn run(
        &self,
        combination: &Combination,
        opts: &CombinationOptions,
        symlink_ok: &mut Option<bool>,
    ) -> Result<PipelineOutcome> {
        let tag = combination.dir_name();
        log::info!("packaging {} v{}", tag, combination.version);

        // Mac-family gate: without symlink support those bundles cannot be
        // laid out, so the combination is skipped before any acquisition.
        if combination.platform.requires_symlinks() {
            let ok = match *symlink_ok {
                Some(cached) => cached,
                None => {
                    let probed = self.probe.supported().await;
                    *symlink_ok = Some(probed);
                    probed
                }
            };
            if !ok {
                log::warn!("skipping {tag}: filesystem does not support symlinks");
                return Ok(PipelineOutcome::Skipped(SkipReason::SymlinksUnsupported));
            }
        }

        let final_path = opts.final_path();
        let work_dir = self.staging.combination_dir(combination, &final_path);

        // Without staging the pipeline extracts straight into the final path,
        // so the overwrite decision has to come before extraction.
        if !self.staging.enabled() && final_path.exists() {
            if !self.request.overwrite {
                log::info!("skipping {tag}: {} already exists", final_path.display());
                return Ok(PipelineOutcome::Skipped(SkipReason::OutputExists));
            }
            fs::remove_path(&final_path).await?;
        }

        self.enter(Stage::Downloading, &tag);
        let archive = self
            .fetcher
            .fetch(combination.platform, combination.arch, &combination.version)
            .await?;

        self.enter(Stage::Extracting, &tag);
        self.staging.prepare(&work_dir).await?;
        self.extractor.extract(&archive, &work_dir).await?;

        self.enter(Stage::PostHooks, &tag);
        for (index, hook) in self.request.hooks.iter().enumerate() {
            hook(
                &work_dir,
                &combination.version,
                combination.platform,
                combination.arch,
            )
            .map_err(|e| PackagerError::Hook {
                index,
                platform: combination.platform.to_string(),
                arch: combination.arch.to_string(),
                reason: e.to_string(),
            })?;
        }

        self.enter(Stage::Finalizing, &tag);
        if self.staging.enabled() && final_path.exists() {
            if !self.request.overwrite {
                log::info!("skipping {tag}: {} already exists", final_path.display());
                return Ok(PipelineOutcome::Skipped(SkipReason::OutputExists));
            }
            fs::remove_path(&final_path).await?;
        }

        self.enter(Stage::Building, &tag);
        let bundle_path = self
            .builders
            .for_platform(combination.platform)
            .build(opts, &work_dir)
            .await?;

        log::info!("done: {}", bundle_path.display());
        Ok(PipelineOutcome::Built(bundle_path))
    }

    fn enter(&self, stage: Stage, tag: &str) {
        log::debug!("{tag}: {stage:?}");
    }
}
