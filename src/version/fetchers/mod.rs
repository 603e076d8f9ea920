//! Per-ecosystem fetcher implementations

pub mod crates_io;
pub mod github;
pub mod gitlab;
pub mod pypi;
pub mod rubygems;
pub mod savannah;
pub mod sourcehut;

pub use crates_io::CratesIoFetcher;
pub use github::GitHubFetcher;
pub use gitlab::GitLabFetcher;
pub use pypi::PypiFetcher;
pub use rubygems::RubyGemsFetcher;
pub use savannah::SavannahFetcher;
pub use sourcehut::SourcehutFetcher;
