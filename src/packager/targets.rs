//! Target platforms, CPU architectures, and the supported-target registry.

use std::fmt;

/// CPU architecture of a runtime release.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86 / i686 (32-bit)
    Ia32,
    /// x86_64 / AMD64 (64-bit)
    X64,
    /// ARMv7 with hard-float (32-bit)
    Armv7l,
    /// AArch64 / ARM64 (64-bit)
    Arm64,
}

impl Arch {
    /// Returns the architecture name used in selectors and release filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Ia32 => "ia32",
            Arch::X64 => "x64",
            Arch::Armv7l => "armv7l",
            Arch::Arm64 => "arm64",
        }
    }

    /// True for 32-bit architectures, which the mac-family runtime releases
    /// do not ship.
    pub fn is_32bit(&self) -> bool {
        matches!(self, Arch::Ia32 | Arch::Armv7l)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target operating system of a bundle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS application bundle
    Darwin,
    /// Linux directory bundle
    Linux,
    /// Mac App Store variant of the macOS bundle
    Mas,
    /// Windows directory bundle
    Win32,
}

impl Platform {
    /// Returns the platform name used in selectors and release filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Darwin => "darwin",
            Platform::Linux => "linux",
            Platform::Mas => "mas",
            Platform::Win32 => "win32",
        }
    }

    /// Whether this platform's bundle format depends on symbolic links.
    ///
    /// The mac-family `.app` layout links framework versions, so packaging it
    /// on a filesystem without symlink support cannot succeed.
    pub fn requires_symlinks(&self) -> bool {
        matches!(self, Platform::Darwin | Platform::Mas)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (platform, architecture, runtime version) triple slated for an
/// independent build pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combination {
    /// Target platform
    pub platform: Platform,
    /// Target architecture
    pub arch: Arch,
    /// Runtime version to package against
    pub version: String,
}

impl Combination {
    /// Deterministic `<platform>-<arch>` name used for staging subdirectories
    /// and final bundle directory suffixes.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.platform, self.arch)
    }
}

/// Immutable registry of supported targets.
///
/// Constructed once at startup and injected into the orchestrator; the
/// declaration order of entries is the order selectors expand to and the
/// order combinations run in.
#[derive(Clone, Debug)]
pub struct Targets {
    archs: Vec<Arch>,
    platforms: Vec<Platform>,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            archs: vec![Arch::Ia32, Arch::X64, Arch::Armv7l, Arch::Arm64],
            platforms: vec![
                Platform::Darwin,
                Platform::Linux,
                Platform::Mas,
                Platform::Win32,
            ],
        }
    }
}

impl Targets {
    /// Creates a registry with an explicit target set.
    pub fn new(archs: Vec<Arch>, platforms: Vec<Platform>) -> Self {
        Self { archs, platforms }
    }

    /// Supported architectures, in registry order.
    pub fn archs(&self) -> &[Arch] {
        &self.archs
    }

    /// Supported platforms, in registry order.
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Looks up an architecture by selector name.
    pub fn arch_by_name(&self, name: &str) -> Option<Arch> {
        self.archs.iter().copied().find(|a| a.as_str() == name)
    }

    /// Looks up a platform by selector name.
    pub fn platform_by_name(&self, name: &str) -> Option<Platform> {
        self.platforms.iter().copied().find(|p| p.as_str() == name)
    }

    /// Expands validated architecture and platform lists into the combination
    /// list, architecture-major and platform-minor.
    ///
    /// The mac-family runtime ships no 32-bit releases, so those pairings are
    /// silently excluded rather than errored.
    pub fn combinations(archs: &[Arch], platforms: &[Platform], version: &str) -> Vec<Combination> {
        let mut combinations = Vec::with_capacity(archs.len() * platforms.len());
        for arch in archs {
            for platform in platforms {
                if platform.requires_symlinks() && arch.is_32bit() {
                    log::debug!("skipping unsupported pairing {platform}-{arch}");
                    continue;
                }
                combinations.push(Combination {
                    platform: *platform,
                    arch: *arch,
                    version: version.to_string(),
                });
            }
        }
        combinations
    }
}
