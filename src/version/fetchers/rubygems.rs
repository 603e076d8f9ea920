//! RubyGems registry fetcher

use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::HttpClient;
use crate::version::types::Version;

#[derive(Debug, Deserialize)]
struct GemVersion {
    number: String,
    #[serde(default)]
    prerelease: bool,
}

/// Fetcher for gems downloaded from rubygems.org
pub struct RubyGemsFetcher {
    http: HttpClient,
    base_url: String,
    gem_path_re: Regex,
}

impl RubyGemsFetcher {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            gem_path_re: Regex::new(r"^/gems/(?P<gem>.+)-(?P<version>[^-]+)\.gem$").unwrap(),
        }
    }

    /// Gem name from `https://rubygems.org/gems/<gem>-<version>.gem`
    fn gem_name(&self, url: &Url) -> Option<String> {
        if url.host_str()? != "rubygems.org" {
            return None;
        }
        let captures = self.gem_path_re.captures(url.path())?;
        Some(captures["gem"].to_string())
    }
}

#[async_trait::async_trait]
impl VersionFetcher for RubyGemsFetcher {
    fn name(&self) -> &'static str {
        "rubygems"
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError> {
        let Some(gem) = self.gem_name(url) else {
            return Ok(vec![]);
        };

        let api_url = format!("{}/api/v1/versions/{}.json", self.base_url, gem);
        let Some(versions) = self
            .http
            .get_json_optional::<Vec<GemVersion>>(&api_url)
            .await?
        else {
            return Ok(vec![]);
        };

        debug!("Found {} versions for gem {}", versions.len(), gem);
        Ok(versions
            .into_iter()
            .filter(|v| !v.number.is_empty())
            .map(|v| Version::with_prerelease(v.number, v.prerelease))
            .collect())
    }
}
