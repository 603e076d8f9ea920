//! GitLab fetcher using the REST API of the instance named in the source URL

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::version::error::FetchError;
use crate::version::fetcher::{SnapshotFetcher, SnapshotOutcome, VersionFetcher};
use crate::version::http::HttpClient;
use crate::version::types::Version;

/// Characters escaped when a tag or branch name goes into a path or query
const REF_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_');

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    #[serde(default)]
    release: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    upcoming_release: bool,
}

#[derive(Debug, Deserialize)]
struct Commit {
    id: String,
    committed_date: String,
}

/// A project on a GitLab instance, as addressed by the archive API
#[derive(Debug, Clone, PartialEq, Eq)]
struct Project {
    /// Scheme, host and port of the instance
    origin: String,
    /// Numeric id or url-encoded `namespace%2Fname`, as it appears in the URL
    id: String,
}

impl Project {
    fn api_url(&self, rest: &str) -> String {
        format!("{}/api/v4/projects/{}/{}", self.origin, self.id, rest)
    }

    /// Plain git clone URL of the project
    fn clone_url(&self) -> Result<Url, FetchError> {
        let path = percent_decode_str(&self.id).decode_utf8_lossy();
        let clone_url = format!("{}/{}.git", self.origin, path);
        Url::parse(&clone_url)
            .map_err(|e| FetchError::InvalidResponse(format!("{clone_url}: {e}")))
    }
}

/// Fetcher for tags, releases and branch snapshots of GitLab projects
pub struct GitLabFetcher {
    http: HttpClient,
}

impl GitLabFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Recognizes `http(s)://<host>/api/v4/projects/<id>/repository/...`
    fn project(url: &Url) -> Option<Project> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let segments: Vec<&str> = url.path_segments()?.collect();
        match segments.as_slice() {
            ["api", "v4", "projects", id, "repository", ..] if !id.is_empty() => Some(Project {
                origin: url.origin().ascii_serialization(),
                id: id.to_string(),
            }),
            _ => None,
        }
    }

    /// Prerelease flag of a tag's release, `None` when the release is gone
    async fn release_flag(&self, project: &Project, tag: &str) -> Result<Option<bool>, FetchError> {
        let encoded = utf8_percent_encode(tag, REF_ENCODE_SET).to_string();
        let release_url = project.api_url(&format!("releases/{encoded}"));
        Ok(self
            .http
            .get_json_optional::<Release>(&release_url)
            .await?
            .map(|release| release.upcoming_release))
    }
}

#[async_trait::async_trait]
impl VersionFetcher for GitLabFetcher {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError> {
        let Some(project) = Self::project(url) else {
            return Ok(vec![]);
        };

        let tags_url = project.api_url("repository/tags");
        let Some(tags) = self.http.get_json_optional::<Vec<Tag>>(&tags_url).await? else {
            return Ok(vec![]);
        };

        let mut releases = Vec::new();
        let mut plain_tags = Vec::new();
        for tag in tags.into_iter().filter(|t| !t.name.is_empty()) {
            if tag.release.as_ref().is_none_or(|r| r.is_null()) {
                plain_tags.push(Version::new(tag.name));
                continue;
            }
            match self.release_flag(&project, &tag.name).await? {
                Some(upcoming) => releases.push(Version::with_prerelease(tag.name, upcoming)),
                None => {
                    warn!("Release for tag {} disappeared, treating it as a tag", tag.name);
                    plain_tags.push(Version::new(tag.name));
                }
            }
        }

        debug!(
            "Found {} releases and {} tags for project {}",
            releases.len(),
            plain_tags.len(),
            project.id
        );
        Ok(if releases.is_empty() { plain_tags } else { releases })
    }
}

#[async_trait::async_trait]
impl SnapshotFetcher for GitLabFetcher {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    async fn fetch_snapshot(
        &self,
        url: &Url,
        branch: &str,
    ) -> Result<SnapshotOutcome, FetchError> {
        let Some(project) = Self::project(url) else {
            return Ok(SnapshotOutcome::Empty);
        };

        let encoded = utf8_percent_encode(branch, REF_ENCODE_SET).to_string();
        let commits_url = project.api_url(&format!("repository/commits?ref_name={encoded}"));
        let (status, body) = self.http.get_status(&commits_url).await?;

        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            let clone_url = project.clone_url()?;
            debug!("Commit API answered {}, retargeting to {}", status, clone_url);
            return Ok(SnapshotOutcome::Retarget(clone_url));
        }

        if !status.is_success() {
            warn!("{} returned status {}", commits_url, status);
            return Err(FetchError::Status {
                url: commits_url,
                status,
            });
        }

        let commits: Vec<Commit> = serde_json::from_str(&body)
            .map_err(|e| FetchError::InvalidResponse(format!("{commits_url}: {e}")))?;
        let Some(commit) = commits.into_iter().next() else {
            return Ok(SnapshotOutcome::Empty);
        };

        let date = DateTime::parse_from_rfc3339(&commit.committed_date)
            .map_err(|e| {
                FetchError::InvalidResponse(format!(
                    "bad commit date '{}': {}",
                    commit.committed_date, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(SnapshotOutcome::Found(Version::snapshot(
            &date.format("%Y-%m-%d").to_string(),
            commit.id,
        )))
    }
}
