//! Tag enumeration
//!
//! Annotated tags are resolved through their tag object to the tagged
//! commit; lightweight tags point at the commit directly.

use super::types::{TagInfo, git_time_to_utc};
use crate::error::Result as SnapResult;
use git2::{Object, Reference, Repository};
use tracing::warn;

const TAG_PREFIX: &str = "refs/tags/";

/// Operations related to tag inspection
pub struct TagOperations<'a> {
    repo: &'a Repository,
}

impl<'a> TagOperations<'a> {
    /// Create a new TagOperations instance
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// List every tag in reference order
    ///
    /// The order is not chronological. Tags that do not lead to a commit
    /// (a tag of a tree or blob) are skipped.
    pub fn list_tags(&self) -> SnapResult<Vec<TagInfo>> {
        let mut tags = Vec::new();

        for reference in self.repo.references_glob("refs/tags/*")? {
            let reference = match reference {
                Ok(reference) => reference,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable tag reference");
                    continue;
                }
            };

            let Some(name) = reference
                .name()
                .map(|n| n.strip_prefix(TAG_PREFIX).unwrap_or(n).to_string())
            else {
                warn!("skipping tag with a non UTF-8 name");
                continue;
            };

            match self.resolve(&name, &reference) {
                Some(tag) => tags.push(tag),
                None => warn!(tag = %name, "tag does not point to a commit, skipping"),
            }
        }

        Ok(tags)
    }

    fn resolve(&self, name: &str, reference: &Reference) -> Option<TagInfo> {
        let target = reference.resolve().ok()?.target()?;
        let object: Object = self.repo.find_object(target, None).ok()?;

        let info = match object.as_tag() {
            Some(tag) => {
                let commit = tag.target().ok()?.peel_to_commit().ok()?;
                let tagger = tag.tagger();
                TagInfo {
                    name: name.to_string(),
                    commit_id: commit.id().to_string(),
                    annotated: true,
                    message: Some(
                        String::from_utf8_lossy(tag.message_bytes().unwrap_or_default())
                            .trim_end()
                            .to_string(),
                    ),
                    tagger_name: Some(
                        tagger
                            .as_ref()
                            .and_then(|t| t.name())
                            .unwrap_or_default()
                            .to_string(),
                    ),
                    tagger_email: Some(
                        tagger
                            .as_ref()
                            .and_then(|t| t.email())
                            .unwrap_or_default()
                            .to_string(),
                    ),
                    tagger_date: Some(
                        tagger
                            .as_ref()
                            .map(|t| git_time_to_utc(t.when()))
                            .unwrap_or_default(),
                    ),
                }
            }
            None => {
                let commit = object.peel_to_commit().ok()?;
                TagInfo {
                    name: name.to_string(),
                    commit_id: commit.id().to_string(),
                    annotated: false,
                    message: None,
                    tagger_name: None,
                    tagger_email: None,
                    tagger_date: None,
                }
            }
        };

        Some(info)
    }
}
