use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Network and git defaults
// =============================================================================

/// Timeout for a single HTTP request in milliseconds (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Depth of the first shallow fetch, on top of the increment
pub const DEFAULT_GIT_INITIAL_DEPTH: u32 = 20;

/// Number of commits added by each `git fetch --deepen`
pub const DEFAULT_GIT_DEPTH_INCREMENT: u32 = 20;

pub const DEFAULT_USER_AGENT: &str = "upstream-version";

/// Resolver configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    pub user_agent: String,
    pub http_timeout_ms: u64,
    pub git: GitConfig,
    pub endpoints: EndpointsConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            git: GitConfig::default(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a JSON file, missing fields keep their defaults
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Shallow fetch tuning for the git fallback
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitConfig {
    pub initial_depth: u32,
    pub depth_increment: u32,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            initial_depth: DEFAULT_GIT_INITIAL_DEPTH,
            depth_increment: DEFAULT_GIT_DEPTH_INCREMENT,
        }
    }
}

/// Base URLs of the upstream services
///
/// GitLab is absent on purpose: its API lives on whatever host the source
/// URL names.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EndpointsConfig {
    pub crates_io: String,
    pub pypi: String,
    pub github: String,
    pub rubygems: String,
    pub savannah: String,
    pub sourcehut: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            crates_io: "https://crates.io".to_string(),
            pypi: "https://pypi.org".to_string(),
            github: "https://github.com".to_string(),
            rubygems: "https://rubygems.org".to_string(),
            savannah: "https://download.savannah.gnu.org".to_string(),
            sourcehut: "https://git.sr.ht".to_string(),
        }
    }
}

/// Returns the path to the data directory for upstream-version.
/// Uses $XDG_DATA_HOME/upstream-version if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/upstream-version,
/// or ./upstream-version if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("upstream-version.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("upstream-version")
}
