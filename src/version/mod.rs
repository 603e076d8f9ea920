//! Upstream version resolution
//!
//! This module looks up the newest release, or the newest commit of a
//! branch, for a project identified only by its source URL.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Resolver   │────▶│  Fetchers   │────▶│    Http     │
//! │  (policy)   │     │(crates,pypi)│     │  (reqwest)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │   Extract   │     │     Git     │
//! │(regex, rc?) │     │  (shallow)  │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`resolver`]: Fallback chains and the final decision
//! - [`fetcher`]: Fetcher traits for releases and branch snapshots
//! - [`fetchers`]: Concrete fetchers (crates.io, PyPI, GitHub, GitLab, ...)
//! - [`git`]: Shallow git fetch fallback for branch snapshots
//! - [`extract`]: Version pattern extraction and stability classification
//! - [`feed`]: Atom/RSS document shapes
//! - [`http`]: HTTP client shared by the fetchers
//! - [`error`]: Error types for fetching and resolution
//! - [`semver`]: Loose version ordering helpers
//! - [`types`]: Common types like `Version` and `ResolutionPolicy`

pub mod error;
pub mod extract;
pub mod feed;
pub mod fetcher;
pub mod fetchers;
pub mod git;
pub mod http;
pub mod resolver;
pub mod semver;
pub mod types;

pub use error::{FetchError, ResolveError};
pub use resolver::Resolver;
pub use types::{Prerelease, ResolutionPolicy, Version, VersionPreference};
