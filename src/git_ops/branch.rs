//! Branch enumeration

use super::types::BranchInfo;
use crate::error::{Result as SnapResult, SnapshotError};
use git2::{Branch, BranchType, Oid, Repository};
use tracing::{debug, warn};

const LOCAL_PREFIX: &str = "refs/heads/";
const REMOTE_PREFIX: &str = "refs/remotes/";

/// Operations related to branch inspection
pub struct BranchOperations<'a> {
    repo: &'a Repository,
}

impl<'a> BranchOperations<'a> {
    /// Create a new BranchOperations instance
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Get the current branch name
    ///
    /// Returns `HEAD` when HEAD is detached. On a freshly initialized
    /// repository the branch HEAD will create is reported.
    pub fn get_current_branch_name(&self) -> SnapResult<String> {
        match self.repo.head() {
            Ok(head) => {
                let head_name = head.name().ok_or_else(|| {
                    SnapshotError::GitOperationFailed(git2::Error::from_str("HEAD has no name"))
                })?;

                if head_name == "HEAD" {
                    return Ok("HEAD".to_string());
                }

                Ok(head_name
                    .strip_prefix(LOCAL_PREFIX)
                    .unwrap_or(head_name)
                    .to_string())
            }
            Err(e) => {
                if e.code() == git2::ErrorCode::UnbornBranch || e.code() == git2::ErrorCode::NotFound
                {
                    Ok(self
                        .unborn_branch_name()
                        .or_else(|| self.get_default_branch_name())
                        .unwrap_or_else(|| "main".to_string()))
                } else {
                    Err(SnapshotError::GitOperationFailed(e))
                }
            }
        }
    }

    /// List local branches followed by remote-tracking branches
    ///
    /// A branch counts as merged when its tip is the commit HEAD points to
    /// or one of that commit's ancestors. With a detached or unborn HEAD
    /// nothing is merged.
    pub fn list_branches(&self) -> SnapResult<Vec<BranchInfo>> {
        let head_tip = self.head_tip();
        let mut branches = Vec::new();

        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(info) = self.local_branch_info(&branch, head_tip) {
                branches.push(info);
            }
        }

        for entry in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = entry?;
            if let Some(info) = self.remote_branch_info(&branch, head_tip) {
                branches.push(info);
            }
        }

        Ok(branches)
    }

    fn local_branch_info(&self, branch: &Branch, head_tip: Option<Oid>) -> Option<BranchInfo> {
        let name = match branch.name() {
            Ok(Some(name)) => name.to_string(),
            _ => {
                warn!("skipping local branch with a non UTF-8 name");
                return None;
            }
        };
        let tip = branch.get().target()?;

        Some(BranchInfo {
            current: branch.is_head(),
            remote: false,
            remote_name: None,
            commit_id: tip.to_string(),
            tracking_branch: self.tracking_branch(&name),
            merged: self.is_merged(tip, head_tip),
            name,
        })
    }

    fn remote_branch_info(&self, branch: &Branch, head_tip: Option<Oid>) -> Option<BranchInfo> {
        let reference = branch.get();
        // Symbolic refs like origin/HEAD have no direct target
        let tip = reference.target()?;
        let full_name = reference.name()?;
        let (remote_name, name) = split_remote_ref(full_name)?;

        Some(BranchInfo {
            name: name.to_string(),
            current: false,
            remote: true,
            remote_name: Some(remote_name.to_string()),
            commit_id: tip.to_string(),
            tracking_branch: None,
            merged: self.is_merged(tip, head_tip),
        })
    }

    /// Upstream branch from `branch.<name>.merge`, without `refs/heads/`
    fn tracking_branch(&self, name: &str) -> Option<String> {
        let config = self.repo.config().ok()?;
        let merge = config.get_string(&format!("branch.{name}.merge")).ok()?;
        Some(
            merge
                .strip_prefix(LOCAL_PREFIX)
                .unwrap_or(&merge)
                .to_string(),
        )
    }

    fn is_merged(&self, tip: Oid, head_tip: Option<Oid>) -> bool {
        let Some(head_tip) = head_tip else {
            return false;
        };
        if tip == head_tip {
            return true;
        }
        match self.repo.graph_descendant_of(head_tip, tip) {
            Ok(merged) => merged,
            Err(e) => {
                debug!(branch_tip = %tip, error = %e, "ancestry check failed");
                false
            }
        }
    }

    /// Commit HEAD's branch points at; `None` when HEAD is detached or unborn
    fn head_tip(&self) -> Option<Oid> {
        if self.repo.head_detached().unwrap_or(false) {
            return None;
        }
        self.repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .map(|commit| commit.id())
    }

    /// Branch an unborn HEAD points at, read from the symbolic HEAD reference
    fn unborn_branch_name(&self) -> Option<String> {
        let head = self.repo.find_reference("HEAD").ok()?;
        let target = head.symbolic_target()?;
        Some(target.strip_prefix(LOCAL_PREFIX).unwrap_or(target).to_string())
    }

    /// Get the default branch name from Git configuration
    fn get_default_branch_name(&self) -> Option<String> {
        let config = self.repo.config().ok()?;
        config.get_string("init.defaultBranch").ok()
    }
}

/// Split `refs/remotes/<remote>/<branch>` into remote and branch name
///
/// The branch part keeps any further slashes (`origin/feature/x` yields
/// `("origin", "feature/x")`).
pub fn split_remote_ref(full_name: &str) -> Option<(&str, &str)> {
    full_name.strip_prefix(REMOTE_PREFIX)?.split_once('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_ref_splits_on_first_segment() {
        assert_eq!(
            split_remote_ref("refs/remotes/origin/main"),
            Some(("origin", "main"))
        );
        assert_eq!(
            split_remote_ref("refs/remotes/upstream/feature/login"),
            Some(("upstream", "feature/login"))
        );
        assert_eq!(split_remote_ref("refs/heads/main"), None);
        assert_eq!(split_remote_ref("refs/remotes/origin"), None);
    }
}
