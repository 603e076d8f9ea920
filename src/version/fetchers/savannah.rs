//! GNU Savannah fetcher scraping the release directory listing

use indexmap::IndexSet;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::HttpClient;
use crate::version::semver::sort_newest_first;
use crate::version::types::Version;

/// Fetcher for `mirror://savannah/<project>/...` sources
pub struct SavannahFetcher {
    http: HttpClient,
    base_url: String,
    link_re: Regex,
    tarball_re: Regex,
}

impl SavannahFetcher {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            link_re: Regex::new(r#"href="([^"]*)""#).unwrap(),
            tarball_re: Regex::new(r"^([0-9][^/]*?)\.tar\.[A-Za-z0-9]+$").unwrap(),
        }
    }

    fn project(url: &Url) -> Option<String> {
        if url.scheme() != "mirror" || url.host_str()? != "savannah" {
            return None;
        }
        url.path_segments()?
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Versions of `project` tarballs linked from a directory listing, newest first
    fn versions_from_listing(&self, project: &str, listing: &str) -> Vec<String> {
        let unique: IndexSet<String> = self
            .link_re
            .captures_iter(listing)
            .filter_map(|link| {
                let file = link[1].rsplit('/').next()?;
                let rest = file.strip_prefix(project)?.strip_prefix('-')?;
                self.tarball_re.captures(rest).map(|c| c[1].to_string())
            })
            .collect();
        let mut versions: Vec<String> = unique.into_iter().collect();
        sort_newest_first(&mut versions);
        versions
    }
}

#[async_trait::async_trait]
impl VersionFetcher for SavannahFetcher {
    fn name(&self) -> &'static str {
        "savannah"
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError> {
        let Some(project) = Self::project(url) else {
            return Ok(vec![]);
        };

        let listing_url = format!("{}/releases/{}/", self.base_url, project);
        let Some(listing) = self.http.get_text_optional(&listing_url).await? else {
            return Ok(vec![]);
        };

        let versions = self.versions_from_listing(&project, &listing);
        debug!("Found {} tarballs for {}", versions.len(), project);
        Ok(versions.into_iter().map(Version::new).collect())
    }
}
