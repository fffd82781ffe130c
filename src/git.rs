//! Minimal "recent changes" collaborator (spec §6): shells out to `git log`
//! for a single file. Explicitly out-of-scope glue per the spec — a pure
//! function from `(root, path, max_count)` to a list of commit summaries,
//! with no caching or state of its own. The Insight Synthesizer is the only
//! caller.

use std::path::Path;
use std::process::Command;

use tracing::debug;

/// One commit touching a file, as reported by `git log`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub relative_date: String,
}

/// Returns `[]` rather than an error when `root` isn't a git repository or
/// `git` isn't on `PATH` — recent-changes data is an enrichment, not a
/// requirement, for an insight.
pub fn recent_changes(root: &Path, relative_path: &Path, max_count: usize) -> Vec<CommitSummary> {
    const FIELD_SEP: char = '\u{1f}';
    let format = format!("--format=%h{FIELD_SEP}%an{FIELD_SEP}%ar{FIELD_SEP}%s");
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .arg("log")
        .arg(format!("-{max_count}"))
        .arg(format)
        .arg("--")
        .arg(relative_path)
        .output();

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            debug!(
                status = ?output.status,
                "git log exited non-zero, treating as no history available"
            );
            return Vec::new();
        }
        Err(err) => {
            debug!(error = %err, "git log could not be spawned");
            return Vec::new();
        }
    };

    let text = String::from_utf8_lossy(&output.stdout);
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split(FIELD_SEP);
            Some(CommitSummary {
                hash: fields.next()?.to_string(),
                author: fields.next()?.to_string(),
                relative_date: fields.next()?.to_string(),
                message: fields.next()?.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn run(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git").arg("-C").arg(dir).args(args).status();
        assert!(status.map(|s| s.success()).unwrap_or(false));
    }

    #[test]
    fn returns_empty_for_non_git_directory() {
        let dir = TempDir::new().unwrap();
        let changes = recent_changes(dir.path(), Path::new("a.rs"), 10);
        assert!(changes.is_empty());
    }

    #[test]
    fn reports_commits_touching_the_file() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["init", "-q"]);
        run(dir.path(), &["config", "user.email", "a@b.c"]);
        run(dir.path(), &["config", "user.name", "tester"]);
        std::fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        run(dir.path(), &["add", "a.rs"]);
        run(dir.path(), &["commit", "-q", "-m", "add a.rs"]);

        let changes = recent_changes(dir.path(), Path::new("a.rs"), 10);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].message, "add a.rs");
        assert_eq!(changes[0].author, "tester");
    }
}
