//! Fetcher traits for looking up upstream versions from various sources

#[cfg(test)]
use mockall::automock;

use url::Url;

use crate::version::error::FetchError;
use crate::version::types::Version;

/// Looks up released versions of a project from one ecosystem
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionFetcher: Send + Sync {
    /// Short name of the ecosystem, used in logs
    fn name(&self) -> &'static str;

    /// Fetches the released versions for the project behind `url`
    ///
    /// # Returns
    /// * `Ok(versions)` - Ordered from newest to oldest, empty when the URL
    ///   does not belong to this ecosystem or the upstream has nothing
    /// * `Err(FetchError)` - If the upstream could not be reached
    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError>;
}

/// Result of asking a forge for the newest commit of a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// The branch tip, as an `unstable-<date>` version
    Found(Version),
    /// The URL is not handled here, or the feed had no commits
    Empty,
    /// The forge has no usable feed for this project; clone from this URL instead
    Retarget(Url),
}

/// Looks up the newest commit of a branch without cloning the repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait SnapshotFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_snapshot(&self, url: &Url, branch: &str)
    -> Result<SnapshotOutcome, FetchError>;
}
