//! Latest version resolution across all fetchers
//!
//! Releases are looked up through the ecosystem fetchers in a fixed priority
//! order: registries first, forges after. The first fetcher that yields an
//! eligible candidate decides the outcome; candidates rejected along the way
//! are kept to explain a failure.
//! Branch snapshots come from the forge feeds, falling back to a shallow git
//! fetch.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::config::ResolverConfig;
use crate::version::error::{FetchError, ResolveError};
use crate::version::extract::{VersionFilter, is_unstable};
use crate::version::fetcher::{SnapshotFetcher, SnapshotOutcome, VersionFetcher};
use crate::version::fetchers::{
    CratesIoFetcher, GitHubFetcher, GitLabFetcher, PypiFetcher, RubyGemsFetcher,
    SavannahFetcher, SourcehutFetcher,
};
use crate::version::git::GitSnapshotFetcher;
use crate::version::http::HttpClient;
use crate::version::types::{ResolutionPolicy, Version, VersionPreference};

/// Resolves the latest upstream version of a source URL
pub struct Resolver {
    fetchers: Vec<Arc<dyn VersionFetcher>>,
    snapshot_fetchers: Vec<Arc<dyn SnapshotFetcher>>,
    git: GitSnapshotFetcher,
}

impl Resolver {
    /// Create a resolver from explicit fetcher chains, tried in the given order
    pub fn new(
        fetchers: Vec<Arc<dyn VersionFetcher>>,
        snapshot_fetchers: Vec<Arc<dyn SnapshotFetcher>>,
        git: GitSnapshotFetcher,
    ) -> Self {
        Self {
            fetchers,
            snapshot_fetchers,
            git,
        }
    }

    /// Create a resolver with every supported ecosystem in priority order
    pub fn from_config(config: &ResolverConfig) -> Result<Self, FetchError> {
        let http = HttpClient::new(config)?;
        let endpoints = &config.endpoints;
        let github = Arc::new(GitHubFetcher::new(http.clone(), &endpoints.github));
        let gitlab = Arc::new(GitLabFetcher::new(http.clone()));

        let fetchers: Vec<Arc<dyn VersionFetcher>> = vec![
            Arc::new(CratesIoFetcher::new(http.clone(), &endpoints.crates_io)),
            Arc::new(PypiFetcher::new(http.clone(), &endpoints.pypi)),
            github.clone(),
            gitlab.clone(),
            Arc::new(RubyGemsFetcher::new(http.clone(), &endpoints.rubygems)),
            Arc::new(SavannahFetcher::new(http.clone(), &endpoints.savannah)),
            Arc::new(SourcehutFetcher::new(http, &endpoints.sourcehut)),
        ];
        let snapshot_fetchers: Vec<Arc<dyn SnapshotFetcher>> = vec![github, gitlab];

        Ok(Self::new(
            fetchers,
            snapshot_fetchers,
            GitSnapshotFetcher::new(config.git),
        ))
    }

    /// Resolve `url` to a single version according to `policy`
    pub async fn fetch_latest_version(
        &self,
        url: &str,
        policy: &ResolutionPolicy,
    ) -> Result<Version, ResolveError> {
        let parsed = Url::parse(url).map_err(|source| ResolveError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        match policy.preference {
            VersionPreference::Branch => {
                let branch = policy.branch.as_deref().ok_or(ResolveError::MissingBranch)?;
                self.fetch_latest_branch(parsed, branch).await
            }
            preference => {
                let filter = VersionFilter::new(&policy.version_regex)?;
                self.fetch_latest_release(&parsed, preference, &filter)
                    .await
            }
        }
    }

    async fn fetch_latest_release(
        &self,
        url: &Url,
        preference: VersionPreference,
        filter: &VersionFilter,
    ) -> Result<Version, ResolveError> {
        let mut filtered: Vec<String> = Vec::new();
        let mut unstable: Vec<String> = Vec::new();

        for fetcher in &self.fetchers {
            let versions = fetcher.fetch(url).await?;
            if versions.is_empty() {
                continue;
            }
            debug!("{} returned {} candidates", fetcher.name(), versions.len());

            let mut eligible = Vec::new();
            for version in &versions {
                let Some(extracted) = filter.extract(version) else {
                    debug!("{} does not match the version regex", version.number);
                    filtered.push(version.number.clone());
                    continue;
                };
                if preference == VersionPreference::Stable
                    && is_unstable(version, &extracted.number)
                {
                    debug!("Skipping unstable version {}", extracted.number);
                    unstable.push(extracted.number);
                    continue;
                }
                eligible.push(extracted);
            }

            if let Some(latest) = eligible.into_iter().next() {
                info!("{} resolved {} to {}", fetcher.name(), url, latest);
                return Ok(latest);
            }
        }

        if !filtered.is_empty() {
            return Err(ResolveError::FilterMismatch { rejected: filtered });
        }
        if let Some(version) = unstable.into_iter().next() {
            return Err(ResolveError::UnstableOnly { version });
        }
        Err(ResolveError::UnsupportedSource)
    }

    async fn fetch_latest_branch(&self, url: Url, branch: &str) -> Result<Version, ResolveError> {
        let mut url = url;

        for fetcher in &self.snapshot_fetchers {
            match fetcher.fetch_snapshot(&url, branch).await? {
                SnapshotOutcome::Found(version) => {
                    info!("{} resolved {} of {} to {}", fetcher.name(), branch, url, version);
                    return Ok(version);
                }
                SnapshotOutcome::Empty => {}
                SnapshotOutcome::Retarget(target) => {
                    debug!("{} retargeted {} to {}", fetcher.name(), url, target);
                    url = target;
                }
            }
        }

        match self.git.fetch_snapshot(&url, branch).await? {
            Some(version) => {
                info!("git resolved {} of {} to {}", branch, url, version);
                Ok(version)
            }
            None => Err(ResolveError::BranchNotFound {
                branch: branch.to_string(),
                url: url.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::fetcher::{MockSnapshotFetcher, MockVersionFetcher};
    use crate::version::types::Prerelease;
    use reqwest::StatusCode;

    const CRATE_URL: &str = "https://crates.io/api/v1/crates/demo/1.0.0/download";

    fn fetcher_returning(versions: Vec<Version>) -> MockVersionFetcher {
        let mut fetcher = MockVersionFetcher::new();
        fetcher.expect_name().return_const("mock");
        fetcher
            .expect_fetch()
            .times(1)
            .returning(move |_| Ok(versions.clone()));
        fetcher
    }

    fn unused_fetcher() -> MockVersionFetcher {
        let mut fetcher = MockVersionFetcher::new();
        fetcher.expect_name().return_const("unused");
        fetcher.expect_fetch().never();
        fetcher
    }

    fn resolver(fetchers: Vec<MockVersionFetcher>) -> Resolver {
        Resolver::new(
            fetchers
                .into_iter()
                .map(|f| Arc::new(f) as Arc<dyn VersionFetcher>)
                .collect(),
            vec![],
            GitSnapshotFetcher::default(),
        )
    }

    fn numbers(numbers: &[&str]) -> Vec<Version> {
        numbers.iter().map(|n| Version::new(*n)).collect()
    }

    #[tokio::test]
    async fn stable_policy_skips_release_candidates() {
        let resolver = resolver(vec![fetcher_returning(numbers(&["2.0.0-rc1", "1.9.0"]))]);

        let version = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::stable())
            .await
            .unwrap();

        assert_eq!(version.number, "1.9.0");
    }

    #[tokio::test]
    async fn unstable_policy_accepts_release_candidates() {
        let resolver = resolver(vec![fetcher_returning(numbers(&["2.0.0-rc1", "1.9.0"]))]);

        let version = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::unstable())
            .await
            .unwrap();

        assert_eq!(version.number, "2.0.0-rc1");
    }

    #[tokio::test]
    async fn explicit_prerelease_flag_overrides_text() {
        let resolver = resolver(vec![fetcher_returning(vec![
            Version::with_prerelease("3.0.0", Prerelease::Yes),
            Version::with_prerelease("2.0.0-rc1", Prerelease::No),
        ])]);

        let version = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::stable())
            .await
            .unwrap();

        assert_eq!(version.number, "2.0.0-rc1");
    }

    #[tokio::test]
    async fn extracted_group_replaces_number() {
        let resolver = resolver(vec![fetcher_returning(vec![Version {
            number: "release-1.4.2".to_string(),
            prerelease: Prerelease::No,
            rev: Some("abc".to_string()),
        }])]);
        let policy = ResolutionPolicy::stable().with_version_regex(r"release-(\d+\.\d+\.\d+)");

        let version = resolver
            .fetch_latest_version(CRATE_URL, &policy)
            .await
            .unwrap();

        assert_eq!(
            version,
            Version {
                number: "1.4.2".to_string(),
                prerelease: Prerelease::No,
                rev: Some("abc".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn first_non_empty_fetcher_wins() {
        let resolver = resolver(vec![
            fetcher_returning(vec![]),
            fetcher_returning(numbers(&["v1.2.0", "v1.1.0"])),
            unused_fetcher(),
        ]);

        let version = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::stable())
            .await
            .unwrap();

        assert_eq!(version.number, "v1.2.0");
    }

    #[tokio::test]
    async fn fetcher_with_only_filtered_candidates_falls_through_and_reports_them() {
        let resolver = resolver(vec![
            fetcher_returning(numbers(&["nightly-1", "nightly-2"])),
            fetcher_returning(vec![]),
        ]);
        let policy = ResolutionPolicy::stable().with_version_regex(r"v(\d+)");

        let error = resolver
            .fetch_latest_version(CRATE_URL, &policy)
            .await
            .unwrap_err();

        match error {
            ResolveError::FilterMismatch { rejected } => {
                assert_eq!(rejected, vec!["nightly-1", "nightly-2"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn filtered_candidates_take_priority_over_unstable_ones() {
        let resolver = resolver(vec![
            fetcher_returning(numbers(&["v2.0-beta"])),
            fetcher_returning(numbers(&["foo"])),
        ]);
        let policy = ResolutionPolicy::stable().with_version_regex(r"v(.*)");

        let error = resolver
            .fetch_latest_version(CRATE_URL, &policy)
            .await
            .unwrap_err();

        assert!(
            matches!(error, ResolveError::FilterMismatch { ref rejected } if rejected == &["foo"])
        );
    }

    #[tokio::test]
    async fn only_unstable_candidates_report_first_of_them() {
        let resolver = resolver(vec![fetcher_returning(numbers(&["2.0rc2", "2.0rc1"]))]);

        let error = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::stable())
            .await
            .unwrap_err();

        assert!(matches!(error, ResolveError::UnstableOnly { ref version } if version == "2.0rc2"));
    }

    #[tokio::test]
    async fn unrecognized_url_is_unsupported() {
        let resolver = resolver(vec![fetcher_returning(vec![]), fetcher_returning(vec![])]);

        let error = resolver
            .fetch_latest_version("https://example.org/foo.tar.gz", &ResolutionPolicy::stable())
            .await
            .unwrap_err();

        assert!(matches!(error, ResolveError::UnsupportedSource));
    }

    #[tokio::test]
    async fn transport_errors_abort_the_chain() {
        let mut failing = MockVersionFetcher::new();
        failing.expect_name().return_const("failing");
        failing.expect_fetch().times(1).returning(|_| {
            Err(FetchError::Status {
                url: "https://crates.io".to_string(),
                status: StatusCode::BAD_GATEWAY,
            })
        });
        let resolver = resolver(vec![failing, unused_fetcher()]);

        let error = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::stable())
            .await
            .unwrap_err();

        assert!(matches!(error, ResolveError::Transport(FetchError::Status { .. })));
    }

    #[tokio::test]
    async fn invalid_filter_is_rejected_before_fetching() {
        let resolver = resolver(vec![unused_fetcher()]);
        let policy = ResolutionPolicy::stable().with_version_regex("no-group");

        let error = resolver
            .fetch_latest_version(CRATE_URL, &policy)
            .await
            .unwrap_err();

        assert!(matches!(error, ResolveError::InvalidFilter(_)));
    }

    #[tokio::test]
    async fn resolving_twice_gives_identical_versions() {
        let mut fetcher = MockVersionFetcher::new();
        fetcher.expect_name().return_const("mock");
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Ok(vec![Version::new("1.0.0")]));
        let resolver = resolver(vec![fetcher]);

        let first = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::stable())
            .await
            .unwrap();
        let second = resolver
            .fetch_latest_version(CRATE_URL, &ResolutionPolicy::stable())
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn branch_policy_requires_a_branch() {
        let resolver = resolver(vec![]);
        let policy = ResolutionPolicy {
            preference: VersionPreference::Branch,
            ..ResolutionPolicy::default()
        };

        let error = resolver
            .fetch_latest_version(CRATE_URL, &policy)
            .await
            .unwrap_err();

        assert!(matches!(error, ResolveError::MissingBranch));
    }

    #[tokio::test]
    async fn branch_policy_returns_first_snapshot_found() {
        let mut first = MockSnapshotFetcher::new();
        first.expect_name().return_const("first");
        first
            .expect_fetch_snapshot()
            .times(1)
            .returning(|_, _| Ok(SnapshotOutcome::Empty));
        let mut second = MockSnapshotFetcher::new();
        second.expect_name().return_const("second");
        second
            .expect_fetch_snapshot()
            .withf(|_, branch| branch == "main")
            .times(1)
            .returning(|_, _| Ok(SnapshotOutcome::Found(Version::snapshot("2024-03-01", "abc"))));
        let resolver = Resolver::new(
            vec![],
            vec![Arc::new(first), Arc::new(second)],
            GitSnapshotFetcher::default(),
        );

        let version = resolver
            .fetch_latest_version("https://github.com/o/r", &ResolutionPolicy::branch("main"))
            .await
            .unwrap();

        assert_eq!(version, Version::snapshot("2024-03-01", "abc"));
    }

    #[tokio::test]
    async fn retarget_applies_to_remaining_snapshot_fetchers() {
        let target = Url::parse("https://example.org/group/project.git").unwrap();
        let mut first = MockSnapshotFetcher::new();
        first.expect_name().return_const("first");
        let retarget = target.clone();
        first
            .expect_fetch_snapshot()
            .times(1)
            .returning(move |_, _| Ok(SnapshotOutcome::Retarget(retarget.clone())));
        let mut second = MockSnapshotFetcher::new();
        second.expect_name().return_const("second");
        second
            .expect_fetch_snapshot()
            .withf(move |url, _| *url == target)
            .times(1)
            .returning(|_, _| Ok(SnapshotOutcome::Found(Version::snapshot("2024-01-01", "def"))));
        let resolver = Resolver::new(
            vec![],
            vec![Arc::new(first), Arc::new(second)],
            GitSnapshotFetcher::default(),
        );

        let version = resolver
            .fetch_latest_version(
                "https://gitlab.example.org/api/v4/projects/1/repository/archive.tar.gz?sha=x",
                &ResolutionPolicy::branch("main"),
            )
            .await
            .unwrap();

        assert_eq!(version.rev.as_deref(), Some("def"));
    }

    #[tokio::test]
    async fn git_fallback_fetches_from_retargeted_url() {
        let (upstream_dir, target) = crate::version::git::tests::upstream(3, "2022-02-22T22:22:22Z");
        let gone = tempfile::TempDir::new().unwrap();
        let source = Url::from_directory_path(gone.path().join("missing")).unwrap();

        let mut forge = MockSnapshotFetcher::new();
        forge.expect_name().return_const("forge");
        let retarget = target.clone();
        forge
            .expect_fetch_snapshot()
            .times(1)
            .returning(move |_, _| Ok(SnapshotOutcome::Retarget(retarget.clone())));
        let mut other = MockSnapshotFetcher::new();
        other.expect_name().return_const("other");
        let expected = target.clone();
        other
            .expect_fetch_snapshot()
            .withf(move |url, _| *url == expected)
            .times(1)
            .returning(|_, _| Ok(SnapshotOutcome::Empty));
        let resolver = Resolver::new(
            vec![],
            vec![Arc::new(forge), Arc::new(other)],
            GitSnapshotFetcher::default(),
        );

        let version = resolver
            .fetch_latest_version(source.as_str(), &ResolutionPolicy::branch("main"))
            .await
            .unwrap();

        assert_eq!(version.number, "unstable-2022-02-22");
        assert_eq!(
            version.rev,
            Some(crate::version::git::tests::head(upstream_dir.path()))
        );
    }

    #[tokio::test]
    async fn git_fallback_reports_retargeted_url_when_branch_is_missing() {
        let (_upstream_dir, target) = crate::version::git::tests::upstream(1, "2022-02-22T22:22:22Z");

        let mut forge = MockSnapshotFetcher::new();
        forge.expect_name().return_const("forge");
        let retarget = target.clone();
        forge
            .expect_fetch_snapshot()
            .times(1)
            .returning(move |_, _| Ok(SnapshotOutcome::Retarget(retarget.clone())));
        let resolver = Resolver::new(vec![], vec![Arc::new(forge)], GitSnapshotFetcher::default());

        let error = resolver
            .fetch_latest_version("https://github.com/o/r", &ResolutionPolicy::branch("gone"))
            .await
            .unwrap_err();

        match error {
            ResolveError::BranchNotFound { branch, url } => {
                assert_eq!(branch, "gone");
                assert_eq!(url, target.to_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
