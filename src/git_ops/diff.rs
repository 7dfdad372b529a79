//! Diff operations module
//!
//! This module turns tree-to-tree diffs into [`FileChange`] lists with
//! best-effort line statistics, and renders unified patches between commits.

use crate::error::{Result as SnapResult, SnapshotError};
use crate::git_ops::types::{ChangeType, FileChange};
use git2::{Commit, Diff, DiffFindOptions, DiffFormat, DiffOptions, Patch, Repository, Tree};
use tracing::debug;

/// Operations for computing differences between tree snapshots
pub struct DiffOperations<'a> {
    /// Reference to the git repository
    repo: &'a Repository,
}

impl<'a> DiffOperations<'a> {
    /// Create a new DiffOperations instance
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Compute one [`FileChange`] per path that differs between two trees
    ///
    /// Rename and copy detection is enabled. Line counts come from the
    /// per-file patch; binary files, or any failure while building a patch,
    /// leave that file's counts at zero instead of failing the whole diff.
    ///
    /// # Arguments
    /// * `old_tree` - The tree before the change, `None` for the empty tree
    /// * `new_tree` - The tree after the change, `None` for the empty tree
    ///
    /// # Errors
    /// Returns SnapshotError::GitOperationFailed if the diff itself cannot be computed
    pub fn diff_trees(
        &self,
        old_tree: Option<&Tree>,
        new_tree: Option<&Tree>,
    ) -> SnapResult<Vec<FileChange>> {
        let diff = self.tree_diff(old_tree, new_tree)?;

        let mut changes = Vec::with_capacity(diff.deltas().len());
        for (index, delta) in diff.deltas().enumerate() {
            let new_path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let old_path = delta
                .old_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| new_path.clone());
            let (lines_added, lines_deleted) = line_counts(&diff, index);

            changes.push(FileChange {
                change_type: ChangeType::from_delta(delta.status()),
                path: new_path,
                old_path,
                lines_added,
                lines_deleted,
                mode: u32::from(delta.new_file().mode()),
            });
        }

        Ok(changes)
    }

    /// Changes a commit introduced relative to its first parent
    ///
    /// Merge commits are diffed against their first parent only; a root
    /// commit has no parent to diff against and yields an empty list.
    pub fn diff_against_first_parent(&self, commit: &Commit) -> SnapResult<Vec<FileChange>> {
        if commit.parent_count() == 0 {
            return Ok(Vec::new());
        }
        let parent_tree = commit.parent(0)?.tree()?;
        let tree = commit.tree()?;
        self.diff_trees(Some(&parent_tree), Some(&tree))
    }

    /// Render a unified patch between two revisions
    ///
    /// # Arguments
    /// * `old_spec` - Any revision spec (hash, short hash, branch, `HEAD~1`)
    /// * `new_spec` - Any revision spec
    ///
    /// # Errors
    /// Returns SnapshotError::InvalidReference if a revision does not resolve
    pub fn diff_between_commits(&self, old_spec: &str, new_spec: &str) -> SnapResult<String> {
        let old_commit = self.resolve_commit(old_spec)?;
        let new_commit = self.resolve_commit(new_spec)?;
        let diff = self.tree_diff(Some(&old_commit.tree()?), Some(&new_commit.tree()?))?;

        let mut output = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                output.push(line.origin());
            }
            output.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(output)
    }

    fn resolve_commit(&self, spec: &str) -> SnapResult<Commit<'a>> {
        self.repo
            .revparse_single(spec)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| SnapshotError::InvalidReference(spec.to_string()))
    }

    fn tree_diff(&self, old_tree: Option<&Tree>, new_tree: Option<&Tree>) -> SnapResult<Diff<'a>> {
        let mut opts = DiffOptions::new();
        opts.ignore_submodules(true);

        let mut diff = self
            .repo
            .diff_tree_to_tree(old_tree, new_tree, Some(&mut opts))
            .map_err(SnapshotError::GitOperationFailed)?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true).copies(true);
        if let Err(e) = diff.find_similar(Some(&mut find_opts)) {
            debug!(error = %e, "rename detection failed, keeping raw deltas");
        }

        Ok(diff)
    }
}

/// Added and deleted line counts for one delta of a diff
///
/// Binary deltas have no textual patch and count as zero, as does any
/// error while generating the patch.
fn line_counts(diff: &Diff, index: usize) -> (i32, i32) {
    match Patch::from_diff(diff, index) {
        Ok(Some(patch)) => match patch.line_stats() {
            Ok((_context, additions, deletions)) => (additions as i32, deletions as i32),
            Err(e) => {
                debug!(index, error = %e, "could not count patch lines");
                (0, 0)
            }
        },
        Ok(None) => (0, 0),
        Err(e) => {
            debug!(index, error = %e, "could not build patch");
            (0, 0)
        }
    }
}
