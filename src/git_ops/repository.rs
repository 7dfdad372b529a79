//! Repository discovery and opening
//!
//! This module decides whether a directory is a usable repository, discovers
//! repositories below a root directory and opens repositories with the error
//! mapping the rest of the crate relies on.

use crate::error::{Result as SnapResult, SnapshotError};
use git2::{Repository, RepositoryOpenFlags};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the directory (or gitlink file) marking a repository root
pub const GIT_DIR_NAME: &str = ".git";

/// Operations related to locating and opening repositories
///
/// Holds a reference to an already opened repository for the per-repository
/// queries; discovery helpers are associated functions.
pub struct RepositoryOperations<'a> {
    repo: &'a Repository,
}

impl<'a> RepositoryOperations<'a> {
    /// Create a new RepositoryOperations instance
    ///
    /// # Arguments
    /// * `repo` - Reference to the Git repository
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Open the repository whose working tree root is `path`
    ///
    /// # Returns
    /// * `Ok(Repository)` - Successfully opened repository
    /// * `Err(SnapshotError::DirectoryNotFound)` - `path` is not a directory
    /// * `Err(SnapshotError::NotARepository)` - no repository at `path`
    /// * `Err(SnapshotError::GitOperationFailed)` - libgit2 failed otherwise
    pub fn open_repository<P: AsRef<Path>>(path: P) -> SnapResult<Repository> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(SnapshotError::DirectoryNotFound(path.to_path_buf()));
        }

        Repository::open_ext(path, RepositoryOpenFlags::NO_SEARCH, &[] as &[&OsStr]).map_err(
            |e| match (e.code(), e.class()) {
                (git2::ErrorCode::NotFound, _) | (_, git2::ErrorClass::Repository) => {
                    SnapshotError::NotARepository(path.to_path_buf())
                }
                _ => SnapshotError::GitOperationFailed(e),
            },
        )
    }

    /// Check whether `path/.git` opens as a repository with an object database
    ///
    /// Never fails; any I/O or libgit2 error means "not a repository".
    pub fn is_valid_repository<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        if !path.join(GIT_DIR_NAME).exists() {
            return false;
        }

        match Repository::open_ext(path, RepositoryOpenFlags::NO_SEARCH, &[] as &[&OsStr]) {
            Ok(repo) => repo.odb().is_ok(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "not a valid repository");
                false
            }
        }
    }

    /// Recursively find repository roots below `root`
    ///
    /// A directory is a repository root when it directly contains a `.git`
    /// entry. `.git` directories are never descended into, but the walk does
    /// continue below a found root, so nested repositories are reported too.
    /// Unreadable subdirectories are skipped.
    pub fn find_repositories<P: AsRef<Path>>(root: P) -> SnapResult<Vec<PathBuf>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SnapshotError::DirectoryNotFound(root.to_path_buf()));
        }

        let mut repositories = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != GIT_DIR_NAME);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry during repository discovery");
                    continue;
                }
            };

            if entry.file_type().is_dir() && entry.path().join(GIT_DIR_NAME).exists() {
                repositories.push(entry.into_path());
            }
        }

        repositories.sort();
        Ok(repositories)
    }

    /// URL of the `origin` remote, read from the repository configuration
    pub fn remote_url(&self) -> Option<String> {
        self.repo
            .config()
            .ok()
            .and_then(|config| config.get_string("remote.origin.url").ok())
    }
}
