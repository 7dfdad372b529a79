//! Git operations module
//!
//! This module provides repository introspection through a modular architecture.
//! Each sub-module owns one concern; [`GitOperations`] opens a repository once
//! and hands the same handle to all of them.

use crate::error::{Result as SnapResult, SnapshotError};
use console::{Color, style};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use git2::Repository;

// Sub-modules for organization
pub mod branch;
pub mod commit;
pub mod diff;
pub mod history;
pub mod repository;
pub mod tag;
pub mod types;

// Re-export main types
pub use history::HistoryAnalysis;
pub use types::*;

use branch::BranchOperations;
use commit::CommitOperations;
use diff::DiffOperations;
use history::HistoryOperations;
use repository::RepositoryOperations;
use tag::TagOperations;

/// Main GitOperations struct that coordinates all git operations
pub struct GitOperations {
    repo: Repository,
    path: PathBuf,
}

impl GitOperations {
    /// Open the repository whose working tree is `path`
    ///
    /// Relative paths resolve against the current working directory.
    ///
    /// # Errors
    /// - SnapshotError::DirectoryNotFound when `path` is not a directory
    /// - SnapshotError::NotARepository when `path` has no repository
    pub fn open<P: AsRef<Path>>(path: P) -> SnapResult<Self> {
        let path = path.as_ref();
        let repo = RepositoryOperations::open_repository(path)?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        debug!(path = %path.display(), "opened repository");
        Ok(GitOperations { repo, path })
    }

    /// Absolute path of the working tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commits(&self) -> CommitOperations<'_> {
        CommitOperations::new(&self.repo)
    }

    pub fn diffs(&self) -> DiffOperations<'_> {
        DiffOperations::new(&self.repo)
    }

    pub fn branches(&self) -> BranchOperations<'_> {
        BranchOperations::new(&self.repo)
    }

    pub fn tags(&self) -> TagOperations<'_> {
        TagOperations::new(&self.repo)
    }

    pub fn history(&self) -> HistoryOperations<'_> {
        HistoryOperations::new(&self.repo)
    }

    /// Build a complete snapshot of the repository
    ///
    /// Contributors, histograms and the creation date come from a single
    /// pass over the full history. Nothing is cached; two calls on an
    /// unchanged repository produce equal snapshots.
    pub fn parse_repository(&self, top_contributors: usize) -> SnapResult<RepositorySnapshot> {
        info!(path = %self.path.display(), "parsing repository");

        let commits = self.commits();
        let history = self.history();
        let latest_commit = commits.latest_commit()?;
        let analysis = history.analyze(top_contributors)?;

        Ok(RepositorySnapshot {
            name: self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: self.path.display().to_string(),
            current_branch: self.branches().get_current_branch_name()?,
            remote_url: RepositoryOperations::new(&self.repo).remote_url(),
            last_updated_date: latest_commit.as_ref().map(|commit| commit.author_date),
            latest_commit,
            branches: self.branches().list_branches()?,
            tags: self.tags().list_tags()?,
            has_uncommitted_changes: history.has_uncommitted_changes()?,
            commit_count: history.commit_count()?,
            statistics: analysis.statistics,
            top_contributors: analysis.top_contributors,
            creation_date: analysis.creation_date,
            file_extension_counts: history.file_extension_counts()?,
        })
    }

    /// Styled summary of one commit, followed by its changed files
    ///
    /// # Errors
    /// Returns SnapshotError::InvalidReference if `spec` does not resolve
    pub fn commit_details(&self, spec: &str) -> SnapResult<String> {
        let commit = self
            .commits()
            .find_commit(spec)
            .ok_or_else(|| SnapshotError::InvalidReference(spec.to_string()))?;

        let mut result = format!(
            "{} {}\n{} {} <{}>\n{} {}\n\n{}\n",
            style("Commit:").fg(Color::White).bold(),
            style(&commit.id).fg(Color::Yellow).bold(),
            style("Author:").fg(Color::White).bold(),
            style(&commit.author_name).fg(Color::Cyan),
            style(&commit.author_email).fg(Color::Cyan),
            style("Date:").fg(Color::White).bold(),
            style(commit.author_date.format("%Y-%m-%d %H:%M:%S")).fg(Color::Green),
            style(commit.message.trim_end()).fg(Color::White)
        );

        if !commit.changed_files.is_empty() {
            let stats = DiffStats::from_changes(&commit.changed_files);
            result.push_str(&format!(
                "\n{} {} files changed ({}, {})\n\n",
                style("Files:").fg(Color::White).bold(),
                style(stats.total_files).fg(Color::Cyan).bold(),
                style(format!("+{}", stats.additions)).fg(Color::Green),
                style(format!("-{}", stats.deletions)).fg(Color::Red)
            ));

            for change in &commit.changed_files {
                let color = match change.change_type {
                    ChangeType::Add => Color::Green,
                    ChangeType::Delete => Color::Red,
                    ChangeType::Modify => Color::Yellow,
                    ChangeType::Rename => Color::Blue,
                    ChangeType::Copy => Color::Magenta,
                };
                let path = if change.old_path != change.path {
                    format!("{} -> {}", change.old_path, change.path)
                } else {
                    change.path.clone()
                };
                result.push_str(&format!(
                    "  {} {}\n",
                    style(change.change_type.code()).fg(color).bold(),
                    style(path).fg(Color::White)
                ));
            }
        }

        Ok(result)
    }
}

/// Open `path` and build its snapshot in one call
pub fn parse_repository<P: AsRef<Path>>(
    path: P,
    top_contributors: usize,
) -> SnapResult<RepositorySnapshot> {
    GitOperations::open(path)?.parse_repository(top_contributors)
}
