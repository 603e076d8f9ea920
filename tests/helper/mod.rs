//! Shared test utilities

#![allow(dead_code)]

pub mod feed;
pub mod git;

pub use feed::commit_feed;
pub use git::{DummyRepo, dummy_git_repo};
