//! Branch snapshot lookup through a shallow git fetch
//!
//! Used when no forge feed can tell us the newest commit of a branch. The
//! branch is fetched into a throwaway repository with a small depth, which is
//! deepened step by step until a commit shows up or the history is complete.
//! The repository lives in a temporary directory that is removed when the
//! lookup finishes, fails or is cancelled.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::GitConfig;
use crate::version::error::FetchError;
use crate::version::types::Version;

/// Variables that would point git at some other repository
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

/// Finds the newest commit of a branch on an arbitrary git remote
#[derive(Debug, Clone, Default)]
pub struct GitSnapshotFetcher {
    config: GitConfig,
    git: GitProgram,
}

impl GitSnapshotFetcher {
    pub fn new(config: GitConfig) -> Self {
        Self {
            config,
            git: GitProgram::default(),
        }
    }

    /// Newest commit of `branch` at `url` as an `unstable-<date>` version
    ///
    /// `Ok(None)` when the remote has no such branch, the branch has no
    /// commits, or `branch` is not a valid branch name.
    pub async fn fetch_snapshot(
        &self,
        url: &Url,
        branch: &str,
    ) -> Result<Option<Version>, FetchError> {
        info!("Fetching {} of {} with git", branch, url);
        let mut clone = ShallowClone::init(url, self.git.clone()).await?;
        let result = clone
            .latest_commit(branch, self.config.initial_depth, self.config.depth_increment)
            .await;
        debug!("git lookup used {} fetch round(s)", clone.fetch_rounds());
        clone.close();
        result
    }
}

/// Output of a git invocation that exited successfully
struct GitOutput {
    stdout: String,
}

/// How git is started; `leading_args` go before any git argument
#[derive(Debug, Clone)]
struct GitProgram {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl Default for GitProgram {
    fn default() -> Self {
        Self {
            program: OsString::from("git"),
            leading_args: Vec::new(),
        }
    }
}

impl GitProgram {
    fn command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        for key in GIT_ENV_OVERRIDES {
            cmd.env_remove(key);
        }
        cmd.args(&self.leading_args)
            .arg("-C")
            .arg(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Run git and fail with its stderr on a non-zero exit
    async fn run(
        &self,
        dir: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<GitOutput, FetchError> {
        let output = self.try_run(dir, args, env).await?;
        output.map_err(|stderr| FetchError::Git {
            command: args.join(" "),
            stderr,
        })
    }

    /// Run git, handing back stderr instead of an error when it exits non-zero
    async fn try_run(
        &self,
        dir: &Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<Result<GitOutput, String>, FetchError> {
        debug!("git {}", args.join(" "));
        let output = self
            .command(dir)
            .args(args)
            .envs(env.iter().copied())
            .output()
            .await?;

        if output.status.success() {
            Ok(Ok(GitOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            }))
        } else {
            Ok(Err(String::from_utf8_lossy(&output.stderr).trim().to_string()))
        }
    }
}

/// Temporary repository with a single `origin` remote
struct ShallowClone {
    dir: TempDir,
    git: GitProgram,
    fetch_rounds: u32,
}

impl ShallowClone {
    /// Create the repository and register the remote; nothing is fetched yet
    async fn init(url: &Url, git: GitProgram) -> Result<Self, FetchError> {
        let dir = tempfile::Builder::new()
            .prefix("upstream-version-")
            .suffix(".git")
            .tempdir()?;

        git.run(dir.path(), &["init", "-q"], &[]).await?;
        git.run(dir.path(), &["remote", "add", "origin", url.as_str()], &[])
            .await?;

        Ok(Self {
            dir,
            git,
            fetch_rounds: 0,
        })
    }

    fn fetch_rounds(&self) -> u32 {
        self.fetch_rounds
    }

    /// Whether `branch` can be handed to git as a branch name and nothing else
    async fn is_branch_name(&self, branch: &str) -> Result<bool, FetchError> {
        // A leading '-' reads as an option, a leading '+' as a forced refspec
        if branch.is_empty() || branch.starts_with(['-', '+']) {
            return Ok(false);
        }
        let check = self
            .git
            .try_run(self.dir.path(), &["check-ref-format", "--branch", branch], &[])
            .await?;
        Ok(check.is_ok())
    }

    /// Fetch `branch` from origin; `false` when the remote does not have it
    async fn fetch(&mut self, depth_arg: &str, branch: &str) -> Result<bool, FetchError> {
        self.fetch_rounds += 1;
        let args = ["fetch", "-q", depth_arg, "--", "origin", branch];
        match self.git.try_run(self.dir.path(), &args, &[]).await? {
            Ok(_) => Ok(true),
            Err(stderr) if stderr.contains("couldn't find remote ref") => {
                debug!("remote ref missing: {}", stderr);
                Ok(false)
            }
            Err(stderr) => Err(FetchError::Git {
                command: args.join(" "),
                stderr,
            }),
        }
    }

    /// Date and hash of the fetched tip, `None` if nothing resolvable was fetched
    async fn tip(&self) -> Result<Option<Version>, FetchError> {
        let log = self
            .git
            .try_run(
                self.dir.path(),
                &[
                    "log",
                    "--format=%cd %H",
                    "--date=format-local:%F",
                    "--max-count=1",
                    "FETCH_HEAD",
                ],
                &[("TZ", "UTC")],
            )
            .await?;

        let stdout = match log {
            Ok(output) => output.stdout,
            Err(stderr) if stderr.contains("unknown revision") || stderr.contains("bad revision") => {
                return Ok(None);
            }
            Err(stderr) => {
                return Err(FetchError::Git {
                    command: "log FETCH_HEAD".to_string(),
                    stderr,
                });
            }
        };

        Ok(stdout
            .trim()
            .split_once(' ')
            .map(|(date, commit)| Version::snapshot(date, commit.trim())))
    }

    async fn is_shallow(&self) -> Result<bool, FetchError> {
        let output = self
            .git
            .run(
                self.dir.path(),
                &["rev-parse", "--is-shallow-repository"],
                &[],
            )
            .await?;
        Ok(output.stdout.trim() != "false")
    }

    /// Newest commit of `branch`, fetching `initial + increment` commits first
    /// and deepening by `increment` while the clone is still shallow
    async fn latest_commit(
        &mut self,
        branch: &str,
        initial: u32,
        increment: u32,
    ) -> Result<Option<Version>, FetchError> {
        if !self.is_branch_name(branch).await? {
            warn!("Refusing to fetch invalid branch name {:?}", branch);
            return Ok(None);
        }

        let depth = format!("--depth={}", initial + increment);
        if !self.fetch(&depth, branch).await? {
            return Ok(None);
        }

        let deepen = format!("--deepen={}", increment.max(1));
        loop {
            if let Some(version) = self.tip().await? {
                return Ok(Some(version));
            }
            if !self.is_shallow().await? {
                debug!("{} has no reachable commit in the complete history", branch);
                return Ok(None);
            }
            debug!("No commit for {} yet, deepening by {}", branch, increment);
            if !self.fetch(&deepen, branch).await? {
                return Ok(None);
            }
        }
    }

    /// Remove the repository, reporting failures instead of ignoring them
    fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove temporary clone {}: {}", path.display(), e);
        }
    }
}
