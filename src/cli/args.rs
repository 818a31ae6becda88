//! Command line argument parsing.

use crate::packager::{ExclusionRules, PackagingRequest, Selector, Staging};
use clap::Parser;
use std::path::PathBuf;

/// Cross-platform application packager
#[derive(Parser, Debug)]
#[command(
    name = "shipkit",
    version,
    about = "Packages an Electron application into platform-specific bundles",
    long_about = "Packages an Electron application into one distributable bundle per \
(platform, architecture) combination.

Usage:
  shipkit --source . --platform linux --arch x64 --out ./dist
  shipkit --source ./app --all --out ./dist --overwrite
  shipkit --platform darwin,mas --arch arm64 --app-version 12.0.5

Pre-existing bundles are skipped unless --overwrite is given; skipped
combinations are not errors."
)]
pub struct Args {
    /// Source project directory containing the package descriptor
    #[arg(short = 's', long, value_name = "DIR", default_value = ".")]
    pub source: PathBuf,

    /// Application name (inferred from the package descriptor when omitted)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Runtime version (inferred from the descriptor's dependencies when omitted)
    #[arg(long, value_name = "VERSION")]
    pub app_version: Option<String>,

    /// Target architectures: comma-separated list, or "all"
    #[arg(short, long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Target platforms: comma-separated list, or "all"
    #[arg(short, long, value_name = "PLATFORM")]
    pub platform: Option<String>,

    /// Package every supported platform and architecture
    #[arg(long, conflicts_with_all = ["arch", "platform"])]
    pub all: bool,

    /// Output directory for finished bundles
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Replace pre-existing bundles instead of skipping them
    #[arg(long)]
    pub overwrite: bool,

    /// Staging directory override (default: under the OS temp dir)
    #[arg(long, value_name = "DIR", conflicts_with = "no_staging")]
    pub staging_dir: Option<PathBuf>,

    /// Work directly in the output directory, with no temp staging
    #[arg(long)]
    pub no_staging: bool,

    /// Regex of source paths excluded from the bundle; repeatable
    #[arg(long = "ignore", value_name = "REGEX")]
    pub ignore: Vec<String>,

    /// Run every combination and report failures together at the end
    #[arg(long)]
    pub best_effort: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Maps the arguments to a packaging request.
    pub fn to_request(&self) -> PackagingRequest {
        let mut builder = PackagingRequest::builder(&self.source)
            .out_dir(&self.out)
            .overwrite(self.overwrite);

        if let Some(name) = &self.name {
            builder = builder.name(name);
        }
        if let Some(version) = &self.app_version {
            builder = builder.version(version);
        }

        if self.all {
            builder = builder.all_targets();
        } else {
            if let Some(arch) = &self.arch {
                builder = builder.arch(Selector::from(arch.as_str()));
            }
            if let Some(platform) = &self.platform {
                builder = builder.platform(Selector::from(platform.as_str()));
            }
        }

        if self.no_staging {
            builder = builder.staging(Staging::Disabled);
        } else if let Some(dir) = &self.staging_dir {
            builder = builder.staging(Staging::Dir(dir.clone()));
        }

        if !self.ignore.is_empty() {
            builder = builder.exclusions(ExclusionRules::Patterns(self.ignore.clone()));
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_map_from_comma_strings() {
        let args = Args::parse_from([
            "shipkit",
            "--platform",
            "linux,win32",
            "--arch",
            "x64",
            "--app-version",
            "10.0.0",
        ]);
        let request = args.to_request();
        assert_eq!(request.platform, Some(Selector::list(["linux", "win32"])));
        assert_eq!(request.arch, Some(Selector::list(["x64"])));
        assert_eq!(request.version.as_deref(), Some("10.0.0"));
    }

    #[test]
    fn all_flag_selects_everything() {
        let args = Args::parse_from(["shipkit", "--all"]);
        let request = args.to_request();
        assert_eq!(request.platform, Some(Selector::All));
        assert_eq!(request.arch, Some(Selector::All));
    }

    #[test]
    fn no_staging_disables_the_staging_area() {
        let args = Args::parse_from(["shipkit", "--no-staging"]);
        let request = args.to_request();
        assert!(matches!(request.staging, Staging::Disabled));
    }

    #[test]
    fn all_conflicts_with_explicit_selectors() {
        let parsed = Args::try_parse_from(["shipkit", "--all", "--platform", "linux"]);
        assert!(parsed.is_err());
    }
}
