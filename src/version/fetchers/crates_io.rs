//! crates.io registry fetcher

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::HttpClient;
use crate::version::semver::semver_prerelease;
use crate::version::types::Version;

/// Response from the crates.io crate API
#[derive(Debug, Deserialize)]
struct CrateResponse {
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    #[serde(default)]
    yanked: bool,
}

/// Fetcher for crates downloaded from crates.io
pub struct CratesIoFetcher {
    http: HttpClient,
    base_url: String,
}

impl CratesIoFetcher {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Crate name from a download URL
    ///
    /// Accepts `https://crates.io/api/v1/crates/<name>/<version>/download`
    /// and `https://static.crates.io/crates/<name>/<name>-<version>.crate`.
    fn crate_name(url: &Url) -> Option<String> {
        let segments: Vec<&str> = url.path_segments()?.collect();
        match (url.host_str()?, segments.as_slice()) {
            ("crates.io", ["api", "v1", "crates", name, ..]) if !name.is_empty() => {
                Some(name.to_string())
            }
            ("static.crates.io", ["crates", name, ..]) if !name.is_empty() => {
                Some(name.to_string())
            }
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl VersionFetcher for CratesIoFetcher {
    fn name(&self) -> &'static str {
        "crates.io"
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError> {
        let Some(name) = Self::crate_name(url) else {
            return Ok(vec![]);
        };

        let api_url = format!("{}/api/v1/crates/{}", self.base_url, name);
        let Some(response) = self.http.get_json_optional::<CrateResponse>(&api_url).await?
        else {
            return Ok(vec![]);
        };

        let versions: Vec<Version> = response
            .versions
            .into_iter()
            .filter(|v| !v.yanked && !v.num.is_empty())
            .map(|v| {
                let prerelease = semver_prerelease(&v.num);
                Version::with_prerelease(v.num, prerelease)
            })
            .collect();

        debug!("Found {} versions for crate {}", versions.len(), name);
        Ok(versions)
    }
}
