//! Sourcehut fetcher reading the refs RSS feed

use tracing::debug;
use url::Url;

use crate::version::error::FetchError;
use crate::version::feed::{self, RssDocument};
use crate::version::fetcher::VersionFetcher;
use crate::version::http::HttpClient;
use crate::version::types::Version;

/// Fetcher for tags of git.sr.ht repositories
pub struct SourcehutFetcher {
    http: HttpClient,
    base_url: String,
}

impl SourcehutFetcher {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `~owner/repo` from a git.sr.ht URL
    fn repository(url: &Url) -> Option<String> {
        if url.host_str()? != "git.sr.ht" {
            return None;
        }
        let mut segments = url.path_segments()?;
        let owner = segments.next().filter(|s| s.starts_with('~') && s.len() > 1)?;
        let repo = segments.next().filter(|s| !s.is_empty())?;
        Some(format!("{owner}/{repo}"))
    }
}

#[async_trait::async_trait]
impl VersionFetcher for SourcehutFetcher {
    fn name(&self) -> &'static str {
        "sourcehut"
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError> {
        let Some(repository) = Self::repository(url) else {
            return Ok(vec![]);
        };

        let feed_url = format!("{}/{}/refs/rss.xml", self.base_url, repository);
        let Some(body) = self.http.get_text_optional(&feed_url).await? else {
            return Ok(vec![]);
        };
        let rss: RssDocument = feed::parse(&feed_url, &body)?;

        let versions: Vec<Version> = rss
            .channel
            .items
            .into_iter()
            .filter_map(|item| item.title)
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .map(Version::new)
            .collect();

        debug!("Found {} refs for {}", versions.len(), repository);
        Ok(versions)
    }
}
