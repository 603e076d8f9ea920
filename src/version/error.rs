use thiserror::Error;

/// Failure of the network or git plumbing underneath a fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(
        "Please specify the version. We can only get the latest version from \
         crates.io/pypi/github/gitlab/rubygems/savannah/sourcehut projects right now"
    )]
    UnsupportedSource,

    #[error(
        "No version matched the regex. The following versions were found:\n{}",
        rejected.join("\n")
    )]
    FilterMismatch { rejected: Vec<String> },

    #[error(
        "Found an unstable version {version}, which is being ignored. \
         To update to unstable version, please use '--version=unstable'"
    )]
    UnstableOnly { version: String },

    #[error("Cannot find a git commit for {branch} in {url}")]
    BranchNotFound { branch: String, url: String },

    #[error("Invalid version regex: {0}")]
    InvalidFilter(String),

    #[error("A branch is required to track branch snapshots")]
    MissingBranch,

    #[error("Invalid source url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error(transparent)]
    Transport(#[from] FetchError),
}
