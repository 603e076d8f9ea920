//! GitHub fetcher backed by the public Atom feeds
//!
//! Feeds need no API token and are not subject to the REST rate limit.

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use crate::version::error::FetchError;
use crate::version::feed::{self, AtomEntry, AtomFeed};
use crate::version::fetcher::{SnapshotFetcher, SnapshotOutcome, VersionFetcher};
use crate::version::http::HttpClient;
use crate::version::types::Version;

/// Owner and repository name of a GitHub project
#[derive(Debug, Clone, PartialEq, Eq)]
struct Repository {
    owner: String,
    repo: String,
}

/// Fetcher for releases, tags and branch snapshots of GitHub projects
pub struct GitHubFetcher {
    http: HttpClient,
    base_url: String,
}

impl GitHubFetcher {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn repository(url: &Url) -> Option<Repository> {
        if url.host_str()? != "github.com" {
            return None;
        }
        let mut segments = url.path_segments()?;
        let owner = segments.next().filter(|s| !s.is_empty())?;
        let repo = segments.next().filter(|s| !s.is_empty())?;
        Some(Repository {
            owner: owner.to_string(),
            repo: repo.strip_suffix(".git").unwrap_or(repo).to_string(),
        })
    }

    /// Fetch an Atom feed, `None` when GitHub does not know the path
    async fn fetch_feed(&self, path: &str) -> Result<Option<AtomFeed>, FetchError> {
        let feed_url = format!("{}/{}", self.base_url, path);
        match self.http.get_text_optional(&feed_url).await? {
            Some(body) => feed::parse(&feed_url, &body).map(Some),
            None => Ok(None),
        }
    }

    /// Versions named by the last segment of each entry link, in feed order
    async fn fetch_tag_feed(&self, path: &str) -> Result<Vec<Version>, FetchError> {
        let Some(feed) = self.fetch_feed(path).await? else {
            return Ok(vec![]);
        };
        Ok(feed
            .entries
            .iter()
            .filter_map(AtomEntry::href)
            .filter_map(feed::last_path_segment)
            .map(Version::new)
            .collect())
    }
}

/// Turn the newest commit feed entry into a snapshot version
fn snapshot_from_entry(entry: &AtomEntry) -> Result<Version, FetchError> {
    let commit = entry
        .href()
        .and_then(feed::last_path_segment)
        .ok_or_else(|| FetchError::InvalidResponse("commit entry without link".to_string()))?;
    let updated = entry
        .updated
        .as_deref()
        .ok_or_else(|| FetchError::InvalidResponse(format!("commit {commit} has no date")))?;
    let date = DateTime::parse_from_rfc3339(updated)
        .map_err(|e| FetchError::InvalidResponse(format!("bad commit date '{updated}': {e}")))?
        .with_timezone(&Utc);

    Ok(Version::snapshot(&date.format("%Y-%m-%d").to_string(), commit))
}

#[async_trait::async_trait]
impl VersionFetcher for GitHubFetcher {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError> {
        let Some(Repository { owner, repo }) = Self::repository(url) else {
            return Ok(vec![]);
        };

        let releases = self
            .fetch_tag_feed(&format!("{owner}/{repo}/releases.atom"))
            .await?;
        if !releases.is_empty() {
            debug!("Found {} releases for {}/{}", releases.len(), owner, repo);
            return Ok(releases);
        }

        debug!("No releases for {}/{}, falling back to tags", owner, repo);
        self.fetch_tag_feed(&format!("{owner}/{repo}/tags.atom"))
            .await
    }
}

#[async_trait::async_trait]
impl SnapshotFetcher for GitHubFetcher {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch_snapshot(
        &self,
        url: &Url,
        branch: &str,
    ) -> Result<SnapshotOutcome, FetchError> {
        let Some(Repository { owner, repo }) = Self::repository(url) else {
            return Ok(SnapshotOutcome::Empty);
        };

        let Some(feed) = self
            .fetch_feed(&format!("{owner}/{repo}/commits/{branch}.atom"))
            .await?
        else {
            let clone_url = format!("{}://github.com/{}/{}.git", url.scheme(), owner, repo);
            debug!("No commit feed for {}/{}, retargeting to {}", owner, repo, clone_url);
            let clone_url = Url::parse(&clone_url)
                .map_err(|e| FetchError::InvalidResponse(format!("{clone_url}: {e}")))?;
            return Ok(SnapshotOutcome::Retarget(clone_url));
        };

        match feed.entries.first() {
            Some(entry) => snapshot_from_entry(entry).map(SnapshotOutcome::Found),
            None => Ok(SnapshotOutcome::Empty),
        }
    }
}
