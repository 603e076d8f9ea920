//! PyPI fetcher for Python source distributions

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::version::error::FetchError;
use crate::version::fetcher::VersionFetcher;
use crate::version::http::HttpClient;
use crate::version::types::Version;

/// PyPI JSON API response structure
#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
}

/// Package information from PyPI
#[derive(Debug, Deserialize)]
struct PypiInfo {
    /// Latest version (according to PyPI)
    version: String,
}

/// Fetcher for sdists served from PyPI
pub struct PypiFetcher {
    http: HttpClient,
    base_url: String,
}

impl PypiFetcher {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Project name from `mirror://pypi/<letter>/<name>/...` or a
    /// `files.pythonhosted.org/packages/source/<letter>/<name>/...` URL
    fn package_name(url: &Url) -> Option<String> {
        let segments: Vec<&str> = url.path_segments()?.collect();
        let name = match (url.scheme(), url.host_str()?, segments.as_slice()) {
            ("mirror", "pypi", [_, name, ..]) => name,
            (_, "files.pythonhosted.org", ["packages", "source", _, name, ..]) => name,
            _ => return None,
        };
        (!name.is_empty()).then(|| name.to_string())
    }
}

#[async_trait::async_trait]
impl VersionFetcher for PypiFetcher {
    fn name(&self) -> &'static str {
        "pypi"
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<Version>, FetchError> {
        let Some(package) = Self::package_name(url) else {
            return Ok(vec![]);
        };

        let api_url = format!("{}/pypi/{}/json", self.base_url, package);
        let Some(response) = self.http.get_json_optional::<PypiResponse>(&api_url).await?
        else {
            return Ok(vec![]);
        };

        debug!("PyPI reports {} as latest for {}", response.info.version, package);
        if response.info.version.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![Version::new(response.info.version)])
    }
}
