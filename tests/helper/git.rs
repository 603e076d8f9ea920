//! Local git repositories with commits at fixed dates

use std::path::Path;
use std::process::Command;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tempfile::TempDir;
use url::Url;

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

pub fn git_command(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd.arg("-C").arg(dir);
    cmd
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = git_command(dir).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

pub fn create_dummy_commit(dir: &Path, date: NaiveDateTime) {
    let datestr = date.format("%FT%TZ").to_string();
    std::fs::write(dir.join("date.txt"), format!("{datestr}\n")).unwrap();
    git(dir, &["add", "date.txt"]);
    let status = git_command(dir)
        .args([
            "-c",
            "user.name=dummy",
            "-c",
            "user.email=dummy@localhost",
            "commit",
            "--quiet",
            "--message=some message",
        ])
        .env("GIT_AUTHOR_DATE", &datestr)
        .env("GIT_COMMITTER_DATE", &datestr)
        .status()
        .unwrap();
    assert!(status.success(), "git commit failed");
}

fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Repository used by the branch tests
pub struct DummyRepo {
    pub dir: TempDir,
}

impl DummyRepo {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn url(&self) -> Url {
        Url::from_directory_path(self.dir.path()).unwrap()
    }

    pub fn tip(&self, branch: &str) -> String {
        git(self.path(), &["rev-parse", branch]).trim().to_string()
    }
}

/// Create a repository with a couple of commits on two branches
///
/// `short` branches off after the 1970-01-02 commits; `master` continues
/// with commits on 1970-01-03 and then 90 commits on 2038-01-19, so the tip
/// of `short` lies more than 40 commits behind the tip of `master`.
pub fn dummy_git_repo() -> DummyRepo {
    let dir = tempfile::Builder::new().suffix(".git").tempdir().unwrap();
    let path = dir.path();
    git(path, &["init", "--quiet", "--initial-branch", "master"]);

    create_dummy_commit(path, midnight(1970, 1, 1));
    let mut date = midnight(1970, 1, 2);
    for _ in 0..10 {
        create_dummy_commit(path, date);
        date += Duration::minutes(10);
    }
    git(path, &["branch", "short"]);
    let mut date = midnight(1970, 1, 3);
    for _ in 0..10 {
        create_dummy_commit(path, date);
        date += Duration::minutes(10);
    }
    let mut date = midnight(2038, 1, 19);
    for _ in 0..90 {
        create_dummy_commit(path, date);
        date += Duration::minutes(10);
    }

    DummyRepo { dir }
}
