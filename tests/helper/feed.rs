//! Atom commit feeds rendered from a local repository

use std::path::Path;

use super::git::git_command;

const ATOM_ENTRY_FORMAT: &str = "  <entry>\n    <link href=\"/%H\"/>\n    <updated>%cd</updated>\n  </entry>";

/// The commit feed GitHub would serve for `branch`
pub fn commit_feed(dir: &Path, branch: &str) -> String {
    let output = git_command(dir)
        .args([
            "log",
            "--date=format-local:%FT%TZ",
            &format!("--format=format:{ATOM_ENTRY_FORMAT}"),
            "--max-count=20",
            branch,
        ])
        .env("TZ", "UTC")
        .output()
        .unwrap();
    assert!(output.status.success(), "git log failed");

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\">\n{}\n</feed>\n",
        String::from_utf8(output.stdout).unwrap()
    )
}
