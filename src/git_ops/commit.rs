//! Commit translation, history walks and commit lookups

use super::diff::DiffOperations;
use super::types::{CommitInfo, FileChange, SHORT_ID_LEN, git_time_to_utc};
use crate::error::{Result as SnapResult, SnapshotError};
use chrono::{DateTime, Utc};
use git2::{Commit, ErrorCode, Oid, Repository, Revwalk, Sort};
use std::fmt::Write as _;
use std::path::Path;
use tracing::warn;

/// Divider printed between entries of the formatted commit log
const LOG_DIVIDER: &str =
    "-------------------------------------------------------------------------------";

/// Operations related to reading commits
pub struct CommitOperations<'a> {
    repo: &'a Repository,
}

impl<'a> CommitOperations<'a> {
    /// Create a new CommitOperations instance
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Convert a raw commit into its normalized form
    ///
    /// Identity, author and committer are copied verbatim. File changes are
    /// computed against the first parent; a failing diff is logged and
    /// yields an empty change list.
    pub fn to_commit(&self, commit: &Commit) -> CommitInfo {
        let id = commit.id().to_string();
        let author = commit.author();
        let committer = commit.committer();

        CommitInfo {
            short_id: id[..SHORT_ID_LEN].to_string(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            author_date: git_time_to_utc(author.when()),
            committer_name: String::from_utf8_lossy(committer.name_bytes()).into_owned(),
            committer_email: String::from_utf8_lossy(committer.email_bytes()).into_owned(),
            commit_date: git_time_to_utc(committer.when()),
            parent_ids: commit.parent_ids().map(|oid| oid.to_string()).collect(),
            changed_files: self.changed_files(commit),
            id,
        }
    }

    /// File changes of a commit against its first parent, empty on failure
    pub fn changed_files(&self, commit: &Commit) -> Vec<FileChange> {
        match DiffOperations::new(self.repo).diff_against_first_parent(commit) {
            Ok(changes) => changes,
            Err(e) => {
                warn!(commit = %commit.id(), error = %e, "diff failed, treating commit as empty");
                Vec::new()
            }
        }
    }

    /// Commit HEAD points to, `None` for an unborn branch
    pub fn get_head_commit(&self) -> SnapResult<Option<Commit<'a>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(SnapshotError::GitOperationFailed(e)),
        }
    }

    /// The most recent commit on HEAD
    pub fn latest_commit(&self) -> SnapResult<Option<CommitInfo>> {
        Ok(self.get_head_commit()?.map(|commit| self.to_commit(&commit)))
    }

    /// Commits reachable from HEAD, newest first, bounded by `max` when given
    pub fn walk_head(&self, max: Option<usize>) -> SnapResult<Vec<Oid>> {
        let Some(head) = self.get_head_commit()? else {
            return Ok(Vec::new());
        };

        let mut revwalk = self.revwalk()?;
        revwalk.push(head.id())?;
        Ok(collect_oids(revwalk, max))
    }

    /// Commits reachable from any branch, tag, remote branch or HEAD
    pub fn walk_all(&self) -> SnapResult<Vec<Oid>> {
        let mut revwalk = self.revwalk()?;
        for glob in ["heads", "tags", "remotes"] {
            revwalk.push_glob(glob)?;
        }
        if let Some(head) = self.get_head_commit()? {
            revwalk.push(head.id())?;
        }
        Ok(collect_oids(revwalk, None))
    }

    /// Number of commits reachable from HEAD
    pub fn commit_count(&self) -> SnapResult<usize> {
        Ok(self.walk_head(None)?.len())
    }

    /// Look up a commit by any revision spec
    ///
    /// Full hashes, unique short hashes, branch and tag names and
    /// expressions like `HEAD~1` are accepted. Anything that does not
    /// resolve to a commit yields `None`.
    pub fn find_commit(&self, spec: &str) -> Option<CommitInfo> {
        let commit = self
            .repo
            .revparse_single(spec)
            .and_then(|object| object.peel_to_commit())
            .ok()?;
        Some(self.to_commit(&commit))
    }

    /// The `max_count` most recent commits on HEAD
    pub fn recent_commits(&self, max_count: usize) -> SnapResult<Vec<CommitInfo>> {
        let oids = self.walk_head(Some(max_count))?;
        Ok(self.load_commits(&oids, |_| true))
    }

    /// Every commit reachable from any reference, newest first
    pub fn all_commits(&self) -> SnapResult<Vec<CommitInfo>> {
        let oids = self.walk_all()?;
        Ok(self.load_commits(&oids, |_| true))
    }

    /// Commits whose author name or email contains `needle`
    pub fn commits_by_author(&self, needle: &str) -> SnapResult<Vec<CommitInfo>> {
        let oids = self.walk_all()?;
        Ok(self.load_commits(&oids, |commit| {
            let author = commit.author();
            author.name().is_some_and(|name| name.contains(needle))
                || author.email().is_some_and(|email| email.contains(needle))
        }))
    }

    /// Commits authored within `[since, until]`, both bounds inclusive
    pub fn commits_by_date_range(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> SnapResult<Vec<CommitInfo>> {
        let oids = self.walk_all()?;
        Ok(self.load_commits(&oids, |commit| {
            let date = git_time_to_utc(commit.author().when());
            since <= date && date <= until
        }))
    }

    /// Commits on HEAD that touched `path`
    ///
    /// A root commit touches every path present in its tree.
    pub fn file_history(&self, path: &str) -> SnapResult<Vec<CommitInfo>> {
        let oids = self.walk_head(None)?;
        let mut history = Vec::new();

        for oid in oids {
            let Some(commit) = self.find_raw(oid) else {
                continue;
            };
            let touched = if commit.parent_count() == 0 {
                commit
                    .tree()
                    .and_then(|tree| tree.get_path(Path::new(path)))
                    .is_ok()
            } else {
                self.changed_files(&commit)
                    .iter()
                    .any(|change| change.path == path || change.old_path == path)
            };
            if touched {
                history.push(self.to_commit(&commit));
            }
        }

        Ok(history)
    }

    /// Human readable log of the `max_count` most recent commits on HEAD
    pub fn formatted_commit_log(&self, max_count: usize) -> SnapResult<String> {
        let mut log = String::new();

        for commit in self.recent_commits(max_count)? {
            let _ = writeln!(log, "Commit: {}", commit.id);
            let _ = writeln!(log, "Author: {} <{}>", commit.author_name, commit.author_email);
            let _ = writeln!(
                log,
                "Date:   {}\n",
                commit.author_date.format("%Y-%m-%d %H:%M:%S")
            );
            let _ = writeln!(log, "    {}\n", commit.message.trim_end().replace('\n', "\n    "));

            if !commit.changed_files.is_empty() {
                log.push_str("    Changed files:\n");
                for change in &commit.changed_files {
                    let _ = writeln!(log, "      {} {}", change.change_type.code(), change.path);
                }
                log.push('\n');
            }

            let _ = writeln!(log, "{LOG_DIVIDER}\n");
        }

        Ok(log)
    }

    /// Line-by-line attribution of a file at HEAD
    ///
    /// Each output line reads `<short id> (<author> - <yyyy-mm-dd>): <text>`.
    ///
    /// # Errors
    /// Returns SnapshotError::InvalidReference when HEAD is unborn, and
    /// SnapshotError::GitOperationFailed when the file is not tracked.
    pub fn file_blame(&self, path: &str) -> SnapResult<String> {
        let head = self
            .get_head_commit()?
            .ok_or_else(|| SnapshotError::InvalidReference("HEAD".to_string()))?;
        let entry = head.tree()?.get_path(Path::new(path))?;
        let blob = self.repo.find_blob(entry.id())?;
        let blame = self.repo.blame_file(Path::new(path), None)?;

        let content = String::from_utf8_lossy(blob.content());
        let mut result = String::new();
        for (index, line) in content.lines().enumerate() {
            let Some(hunk) = blame.get_line(index + 1) else {
                continue;
            };
            let commit_id = hunk.final_commit_id();
            let (author, date) = match self.repo.find_commit(commit_id) {
                Ok(commit) => {
                    let author = commit.author();
                    (
                        author.name().unwrap_or("Unknown").to_string(),
                        git_time_to_utc(author.when()).format("%Y-%m-%d").to_string(),
                    )
                }
                Err(_) => ("Unknown".to_string(), "unknown".to_string()),
            };
            let short_id = &commit_id.to_string()[..SHORT_ID_LEN];
            let _ = writeln!(result, "{short_id} ({author} - {date}): {line}");
        }

        Ok(result)
    }

    fn revwalk(&self) -> SnapResult<Revwalk<'a>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        Ok(revwalk)
    }

    fn find_raw(&self, oid: Oid) -> Option<Commit<'a>> {
        match self.repo.find_commit(oid) {
            Ok(commit) => Some(commit),
            Err(e) => {
                warn!(commit = %oid, error = %e, "skipping unreadable commit");
                None
            }
        }
    }

    fn load_commits<F>(&self, oids: &[Oid], mut keep: F) -> Vec<CommitInfo>
    where
        F: FnMut(&Commit) -> bool,
    {
        oids.iter()
            .filter_map(|oid| self.find_raw(*oid))
            .filter(|commit| keep(commit))
            .map(|commit| self.to_commit(&commit))
            .collect()
    }
}

/// Drain a revwalk, skipping entries libgit2 fails to produce
fn collect_oids(revwalk: Revwalk, max: Option<usize>) -> Vec<Oid> {
    revwalk
        .filter_map(|oid| match oid {
            Ok(oid) => Some(oid),
            Err(e) => {
                warn!(error = %e, "skipping unreadable history entry");
                None
            }
        })
        .take(max.unwrap_or(usize::MAX))
        .collect()
}
