//! Common types shared by fetchers and the resolver

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Version pattern used when the caller does not restrict candidates
pub const DEFAULT_VERSION_REGEX: &str = "(.*)";

/// Whether a candidate is known to be a pre-release
///
/// Registries that publish a prerelease flag report it explicitly; everything
/// else is `Unknown` and gets classified from the version text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Prerelease {
    Yes,
    No,
    #[default]
    Unknown,
}

impl From<bool> for Prerelease {
    fn from(value: bool) -> Self {
        if value { Prerelease::Yes } else { Prerelease::No }
    }
}

/// A candidate version produced by a fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    /// Raw version text, or the extracted part once the resolver accepted it
    pub number: String,
    pub prerelease: Prerelease,
    /// Commit hash, only set for branch snapshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

impl Version {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            prerelease: Prerelease::Unknown,
            rev: None,
        }
    }

    pub fn with_prerelease(number: impl Into<String>, prerelease: impl Into<Prerelease>) -> Self {
        Self {
            number: number.into(),
            prerelease: prerelease.into(),
            rev: None,
        }
    }

    /// Snapshot of a branch tip committed on `date` (`YYYY-MM-DD`, UTC)
    pub fn snapshot(date: &str, rev: impl Into<String>) -> Self {
        Self {
            number: format!("unstable-{date}"),
            prerelease: Prerelease::Unknown,
            rev: Some(rev.into()),
        }
    }

    /// Version number without a leading `v`, as written into package files
    pub fn display_number(&self) -> &str {
        self.number.strip_prefix('v').unwrap_or(&self.number)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rev {
            Some(rev) => write!(f, "{} ({})", self.number, rev),
            None => f.write_str(&self.number),
        }
    }
}

/// Which kind of version the caller is willing to accept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VersionPreference {
    /// Latest release that is not classified as a pre-release
    #[default]
    Stable,
    /// Latest release, pre-releases included
    Unstable,
    /// Newest commit of a branch
    Branch,
}

impl VersionPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionPreference::Stable => "stable",
            VersionPreference::Unstable => "unstable",
            VersionPreference::Branch => "branch",
        }
    }
}

impl FromStr for VersionPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(VersionPreference::Stable),
            "unstable" => Ok(VersionPreference::Unstable),
            "branch" => Ok(VersionPreference::Branch),
            other => Err(format!(
                "unknown version preference '{other}' (expected stable, unstable or branch)"
            )),
        }
    }
}

impl fmt::Display for VersionPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller supplied parameters for one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPolicy {
    pub preference: VersionPreference,
    /// Pattern with one capture group, matched at the start of each candidate
    pub version_regex: String,
    /// Branch to track, required for [`VersionPreference::Branch`]
    pub branch: Option<String>,
}

impl ResolutionPolicy {
    pub fn stable() -> Self {
        Self::default()
    }

    pub fn unstable() -> Self {
        Self {
            preference: VersionPreference::Unstable,
            ..Self::default()
        }
    }

    pub fn branch(branch: impl Into<String>) -> Self {
        Self {
            preference: VersionPreference::Branch,
            version_regex: DEFAULT_VERSION_REGEX.to_string(),
            branch: Some(branch.into()),
        }
    }

    pub fn with_version_regex(mut self, version_regex: impl Into<String>) -> Self {
        self.version_regex = version_regex.into();
        self
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            preference: VersionPreference::Stable,
            version_regex: DEFAULT_VERSION_REGEX.to_string(),
            branch: None,
        }
    }
}
