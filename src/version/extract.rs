//! Version extraction and stability classification
//!
//! Every candidate a fetcher returns goes through the caller's version
//! pattern first; the text captured by its single group becomes the version
//! number from then on.

use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::ResolveError;
use crate::version::types::{Prerelease, Version};

static UNSTABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)rc|alpha|beta|preview|nightly|m[0-9]+").unwrap());

/// Compiled caller pattern, anchored at the start of the candidate
#[derive(Debug, Clone)]
pub struct VersionFilter {
    regex: Regex,
}

impl VersionFilter {
    pub fn new(pattern: &str) -> Result<Self, ResolveError> {
        let regex = Regex::new(&format!("^(?:{pattern})"))
            .map_err(|e| ResolveError::InvalidFilter(e.to_string()))?;

        // Group 0 is the whole match
        if regex.captures_len() < 2 {
            return Err(ResolveError::InvalidFilter(format!(
                "'{pattern}' has no capture group"
            )));
        }

        Ok(Self { regex })
    }

    /// Returns the candidate with its number replaced by the first capture group
    ///
    /// `None` when the pattern does not match or the group captured nothing.
    pub fn extract(&self, version: &Version) -> Option<Version> {
        let captures = self.regex.captures(&version.number)?;
        let group = captures.get(1)?.as_str();
        if group.is_empty() {
            return None;
        }

        Some(Version {
            number: group.to_string(),
            prerelease: version.prerelease,
            rev: version.rev.clone(),
        })
    }
}

/// Whether a candidate counts as a pre-release
///
/// An explicit flag from the registry wins; otherwise the extracted text is
/// searched for the usual pre-release markers.
pub fn is_unstable(version: &Version, extracted: &str) -> bool {
    match version.prerelease {
        Prerelease::Yes => true,
        Prerelease::No => false,
        Prerelease::Unknown => UNSTABLE_RE.is_match(extracted),
    }
}
