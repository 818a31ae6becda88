//! Packaging request configuration and per-combination option views.

use crate::error::{PackagerError, Result};
use crate::packager::targets::{Arch, Platform};
use crate::packager::validate::Selector;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Caller-supplied function invoked after archive extraction and before
/// platform-specific building, once per combination.
///
/// Receives the combination's staging directory, the runtime version, and the
/// combination's platform and architecture.
pub type PostExtractHook =
    Arc<dyn Fn(&Path, &str, Platform, Arch) -> anyhow::Result<()> + Send + Sync>;

/// Caller-supplied predicate deciding whether a source path is excluded from
/// the bundle. Receives the path relative to the source project directory.
pub type ExclusionPredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Staging-directory configuration.
#[derive(Clone, Debug, Default)]
pub enum Staging {
    /// Stage under the OS temp dir (`<tmp>/shipkit`)
    #[default]
    Default,
    /// Stage under an explicit root
    Dir(PathBuf),
    /// No staging: combinations work directly in their final output path
    Disabled,
}

/// Path-exclusion configuration.
///
/// Patterns are regular expressions matched against each source path relative
/// to the project directory, with a leading `/`. When a custom predicate is
/// supplied the default patterns are not merged in.
#[derive(Clone, Default)]
pub enum ExclusionRules {
    /// Only the default exclusions
    #[default]
    Defaults,
    /// User patterns, merged with the defaults
    Patterns(Vec<String>),
    /// Custom predicate; defaults are not applied
    Predicate(ExclusionPredicate),
}

impl std::fmt::Debug for ExclusionRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionRules::Defaults => f.write_str("ExclusionRules::Defaults"),
            ExclusionRules::Patterns(p) => f.debug_tuple("ExclusionRules::Patterns").field(p).finish(),
            ExclusionRules::Predicate(_) => f.write_str("ExclusionRules::Predicate(..)"),
        }
    }
}

/// Exclusions applied to the bundled app source.
///
/// The runtime's own install directories, version-control metadata, the
/// packaging tool's install directory, and binary-tool directories never
/// belong inside a bundle.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "/node_modules/electron($|/)",
    "/node_modules/electron-prebuilt($|/)",
    "/node_modules/shipkit($|/)",
    "/node_modules/\\.bin($|/)",
    "/\\.git($|/)",
];

/// Compiled exclusion rules, shared by every combination of one run.
#[derive(Clone)]
pub enum Exclusions {
    /// Compiled regex patterns
    Patterns(Arc<Vec<regex::Regex>>),
    /// Custom predicate
    Predicate(ExclusionPredicate),
}

impl std::fmt::Debug for Exclusions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exclusions::Patterns(p) => f.debug_tuple("Exclusions::Patterns").field(p).finish(),
            Exclusions::Predicate(_) => f.write_str("Exclusions::Predicate(..)"),
        }
    }
}

impl Exclusions {
    /// Compiles exclusion rules, merging `extra_patterns` (such as the output
    /// directory when it nests inside the source tree) and the defaults into
    /// pattern-based rules. Predicates pass through untouched.
    pub fn compile(rules: &ExclusionRules, extra_patterns: &[String]) -> Result<Self> {
        let user: &[String] = match rules {
            ExclusionRules::Predicate(p) => return Ok(Exclusions::Predicate(p.clone())),
            ExclusionRules::Defaults => &[],
            ExclusionRules::Patterns(patterns) => patterns,
        };

        let mut compiled = Vec::with_capacity(user.len() + extra_patterns.len() + DEFAULT_EXCLUSIONS.len());
        for source in user
            .iter()
            .map(String::as_str)
            .chain(extra_patterns.iter().map(String::as_str))
            .chain(DEFAULT_EXCLUSIONS.iter().copied())
        {
            let re = regex::Regex::new(source).map_err(|e| PackagerError::Validation {
                reason: format!("invalid exclusion pattern \"{source}\": {e}"),
            })?;
            compiled.push(re);
        }
        Ok(Exclusions::Patterns(Arc::new(compiled)))
    }

    /// Whether the given source-relative path is excluded from the bundle.
    pub fn excludes(&self, rel: &Path) -> bool {
        match self {
            Exclusions::Predicate(p) => p(rel),
            Exclusions::Patterns(patterns) => {
                let candidate = format!("/{}", rel.to_string_lossy().replace('\\', "/"));
                patterns.iter().any(|re| re.is_match(&candidate))
            }
        }
    }

    /// Adapter for [`crate::util::fs::copy_dir_filtered`]: keeps what is not
    /// excluded.
    pub fn keep_filter(&self) -> Arc<dyn Fn(&Path) -> bool + Send + Sync> {
        let rules = self.clone();
        Arc::new(move |rel| !rules.excludes(rel))
    }
}

/// User-supplied packaging configuration.
///
/// Name and version may start unset; metadata resolution fills them in before
/// any pipeline runs. Everything else is read-only for the rest of the run.
#[derive(Clone)]
pub struct PackagingRequest {
    /// Application name; inferred from the package descriptor when unset
    pub name: Option<String>,
    /// Runtime version; inferred from the descriptor's dependencies when unset
    pub version: Option<String>,
    /// Requested architecture selector
    pub arch: Option<Selector>,
    /// Requested platform selector
    pub platform: Option<Selector>,
    /// Directory final bundles are written to
    pub out_dir: PathBuf,
    /// Replace pre-existing bundle paths instead of skipping them
    pub overwrite: bool,
    /// Staging-directory override or disable
    pub staging: Staging,
    /// Post-extract hooks, invoked in declaration order
    pub hooks: Vec<PostExtractHook>,
    /// Path-exclusion patterns or predicate
    pub exclusions: ExclusionRules,
    /// Source project directory
    pub source_dir: PathBuf,
}

impl std::fmt::Debug for PackagingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagingRequest")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("arch", &self.arch)
            .field("platform", &self.platform)
            .field("out_dir", &self.out_dir)
            .field("overwrite", &self.overwrite)
            .field("staging", &self.staging)
            .field("hooks", &format_args!("[{} hooks]", self.hooks.len()))
            .field("exclusions", &self.exclusions)
            .field("source_dir", &self.source_dir)
            .finish()
    }
}

impl PackagingRequest {
    /// Starts building a request for the given source project directory.
    pub fn builder<P: AsRef<Path>>(source_dir: P) -> RequestBuilder {
        RequestBuilder::new(source_dir)
    }
}

/// Builder for [`PackagingRequest`].
#[derive(Default)]
pub struct RequestBuilder {
    name: Option<String>,
    version: Option<String>,
    arch: Option<Selector>,
    platform: Option<Selector>,
    out_dir: Option<PathBuf>,
    overwrite: bool,
    staging: Staging,
    hooks: Vec<PostExtractHook>,
    exclusions: ExclusionRules,
    source_dir: PathBuf,
}

impl RequestBuilder {
    /// Creates a builder for the given source project directory.
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Sets the application name.
    ///
    /// If not set, the name is inferred from the package descriptor.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the runtime version to package against.
    ///
    /// If not set, the version is inferred from the descriptor's runtime
    /// dependency declaration.
    pub fn version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the architecture selector.
    pub fn arch(mut self, selector: Selector) -> Self {
        self.arch = Some(selector);
        self
    }

    /// Sets the platform selector.
    pub fn platform(mut self, selector: Selector) -> Self {
        self.platform = Some(selector);
        self
    }

    /// Selects every supported platform and architecture.
    pub fn all_targets(mut self) -> Self {
        self.arch = Some(Selector::All);
        self.platform = Some(Selector::All);
        self
    }

    /// Sets the output directory.
    ///
    /// Default: current directory
    pub fn out_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.out_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Replaces pre-existing bundle paths instead of skipping them.
    ///
    /// Default: false (pre-existing outputs are skipped)
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Overrides or disables the staging directory.
    pub fn staging(mut self, staging: Staging) -> Self {
        self.staging = staging;
        self
    }

    /// Appends a post-extract hook.
    pub fn hook(mut self, hook: PostExtractHook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Sets path-exclusion patterns or a predicate.
    pub fn exclusions(mut self, rules: ExclusionRules) -> Self {
        self.exclusions = rules;
        self
    }

    /// Builds the request.
    pub fn build(self) -> PackagingRequest {
        PackagingRequest {
            name: self.name,
            version: self.version,
            arch: self.arch,
            platform: self.platform,
            out_dir: self.out_dir.unwrap_or_else(|| PathBuf::from(".")),
            overwrite: self.overwrite,
            staging: self.staging,
            hooks: self.hooks,
            exclusions: self.exclusions,
            source_dir: self.source_dir,
        }
    }
}

/// Per-combination options view handed to platform builders.
///
/// The request's resolved settings overridden with one combination's platform
/// and architecture.
#[derive(Clone)]
pub struct CombinationOptions {
    /// Resolved application name
    pub name: String,
    /// Resolved runtime version
    pub version: String,
    /// This combination's platform
    pub platform: Platform,
    /// This combination's architecture
    pub arch: Arch,
    /// Directory the final bundle is written to
    pub out_dir: PathBuf,
    /// Source project directory
    pub source_dir: PathBuf,
    /// Compiled exclusion rules for the app source copy
    pub exclusions: Exclusions,
}

impl CombinationOptions {
    /// `<out>/<name>-<platform>-<arch>`, the bundle's final directory.
    pub fn final_path(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}-{}-{}", self.name, self.platform, self.arch))
    }
}
